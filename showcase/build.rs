use std::io::Result;

fn main() -> Result<()> {
    // List of proto files containing a service definition
    let proto_files = &["proto/echo.proto", "proto/google/longrunning/operations.proto"];

    // Name of the folder containing the proto definitions
    let proto_folder = "proto";

    // The status and operation messages are the ones `gapic_core` polls with.
    tonic_prost_build::configure()
        .build_client(false)
        .extern_path(".google.rpc", "::gapic_core::proto::rpc")
        .extern_path(".google.longrunning", "::gapic_core::proto::longrunning")
        .compile_protos(proto_files, &[proto_folder])?;

    Ok(())
}
