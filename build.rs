fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Compile protobuf definitions for the backend gRPC contracts.
    // Server stubs are generated only for the integration-test mock backends.
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(
            &[
                "proto/user.proto",
                "proto/wallet.proto",
                "proto/order.proto",
                "proto/payment.proto",
                "proto/currency.proto",
                "proto/price.proto",
                "proto/secret.proto",
                "proto/password.proto",
                "proto/blog.proto",
            ],
            &["proto"],
        )?;

    println!("cargo:rerun-if-changed=proto");
    Ok(())
}
