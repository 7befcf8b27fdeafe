fn main() -> Result<(), Box<dyn std::error::Error>> {
    const PROTO: &str = "proto/metastore.proto";

    // Vendored protoc; the proto imports nothing outside proto/.
    let protoc = protoc_bin_vendored::protoc_bin_path()?;
    unsafe {
        std::env::set_var("PROTOC", protoc);
    }

    println!("cargo:rerun-if-changed={PROTO}");
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&[PROTO], &["proto"])?;
    Ok(())
}
