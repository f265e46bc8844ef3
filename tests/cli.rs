//! Utility mode of the binary.

use std::process::Command;

use axum::http::Method;
use imgproxy::routing;

fn encode_with_binary(value: &str) -> String {
    let output = Command::new(env!("CARGO_BIN_EXE_imgproxy"))
        .args(["-u", value])
        .output()
        .unwrap();
    assert!(output.status.success());
    String::from_utf8(output.stdout).unwrap().trim_end().to_string()
}

#[test]
fn prints_encoding_and_exits() {
    assert_eq!(
        encode_with_binary("http://example.com"),
        "aHR0cDovL2V4YW1wbGUuY29t"
    );
}

#[test]
fn utility_output_round_trips_through_the_decoder() {
    // Already canonical, so the target must come back byte for byte.
    for url in [
        "http://example.com/",
        "https://example.com/a.png?w=1",
        "https://cdn.example.org:8443/x/y~z_",
        "http://127.0.0.1:8080/img/%20space.png#frag",
    ] {
        let encoded = encode_with_binary(url);
        let target = routing::resolve(&Method::GET, &format!("/{encoded}.png")).unwrap();
        assert_eq!(target.as_str(), url);
    }
}
