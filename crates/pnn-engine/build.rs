use std::env;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// IEC 61966-2-1 formula: sRGB to linear
fn srgb_to_linear_exact(srgb: f64) -> f64 {
    if srgb > 0.04045 {
        ((srgb + 0.055) / 1.055).powf(2.4)
    } else {
        srgb / 12.92
    }
}

fn main() {
    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("gamma_lut.rs");
    let mut file = File::create(&dest_path).unwrap();

    // One entry per 8-bit channel value; pixels never carry more precision.
    writeln!(file, "/// Lookup table for sRGB to linear conversion").unwrap();
    writeln!(file, "/// Index: 8-bit sRGB channel value, Value: linear value").unwrap();
    writeln!(file, "pub static SRGB_TO_LINEAR: [f64; 256] = [").unwrap();
    for i in 0..256 {
        let linear = srgb_to_linear_exact(i as f64 / 255.0);
        if i > 0 && i % 4 == 0 {
            writeln!(file).unwrap();
        }
        write!(file, "    {:.17e},", linear).unwrap();
    }
    writeln!(file, "\n];").unwrap();

    println!("cargo::rerun-if-changed=build.rs");
}
