fn main() -> std::io::Result<()> {
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["proto/cri/runtime/v1/api.proto"], &["proto/cri"])?;

    Ok(())
}
