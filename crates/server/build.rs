use std::path::PathBuf;

use prost::Message;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=proto/navigation.proto");

    // Parse the schema in-process so builds do not need a system protoc.
    let descriptors = protox::compile(["navigation.proto"], ["proto"])?;
    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);
    let descriptor_path = out_dir.join("navigation_descriptor.bin");
    std::fs::write(&descriptor_path, descriptors.encode_to_vec())?;

    let mut config = prost_build::Config::new();
    config.file_descriptor_set_path(&descriptor_path).skip_protoc_run();
    tonic_build::configure().compile_with_config(config, &["navigation.proto"], &["proto"])?;
    Ok(())
}
