#[cfg(not(any(feature = "rustls_backend", feature = "native_tls_backend")))]
compile_error!(
    "Tempest talks to the Discord REST API over HTTPS, so either the `rustls_backend` or the \
    `native_tls_backend` feature must be selected.\n\
    - `rustls_backend` uses Rustls, a pure Rust TLS-implemenation.\n\
    - `native_tls_backend` uses SChannel on Windows, Secure Transport on macOS, \
    and OpenSSL on other platforms.\n\
    If you are unsure, go with `rustls_backend`."
);

fn main() {}
