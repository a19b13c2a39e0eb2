// geodata_server/server/build.rs

fn main() {
    // Build-time information (version, profile, rustc) for the start-up banner
    built::write_built_file().expect("Failed to acquire build-time information");
    println!("cargo:rerun-if-changed=build.rs");
}
