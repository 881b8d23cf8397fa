fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate gRPC server and client code from proto files
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .protoc_arg("--experimental_allow_proto3_optional")
        .compile(&["../proto/user.proto"], &["../proto"])?;

    println!("cargo:rerun-if-changed=../proto/user.proto");

    Ok(())
}
