//! Image Background Changer
//!
//! Interactive console tool that removes an image's background with a
//! pretrained segmentation model and composites the foreground over a
//! solid color.

#[cfg(feature = "cli")]
fn main() -> anyhow::Result<()> {
    bgswap::cli::main()
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
