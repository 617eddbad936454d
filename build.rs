use std::env;
use std::f64;
use std::fmt::{Display, Write};
use std::fs;
use std::path::Path;

fn main() {
    let out_dir = env::var_os("OUT_DIR").unwrap();
    let out_dir = Path::new(&out_dir);

    gen_fft_sin_table(out_dir);

    println!("cargo:rerun-if-changed=build.rs");
}

fn gen_fft_sin_table(out_dir: &Path) {
    // must match `config::fft::LEN`
    write_sin_table::<1024>(&out_dir.join("fft_sin_table.rs"));
}

fn write_sin_table<const LEN: usize>(file_path: &Path) {
    let table = {
        let mut table = [0; LEN];
        for (i, x) in table.iter_mut().enumerate() {
            let sample = f64::sin(2.0 * f64::consts::PI * i as f64 / LEN as f64);
            let fixed_point = (i16::MAX as f64 * sample).round() as i16;
            *x = fixed_point;
        }
        table
    };

    write_table(file_path, &table)
}

fn write_table<T>(file_path: &Path, table: &[T])
where
    T: Display + NumericSuffix,
{
    let mut out = String::new();

    out.push('[');
    let mut first = true;
    for x in table {
        write!(out, "{}", x).unwrap();
        if first {
            first = false;
            // add type suffix to first element to ensure we don't accidentally use the wrong type
            out.push_str(T::SUFFIX);
        }
        out.push_str(",\n");
    }
    out.push(']');

    fs::write(file_path, out).unwrap();
}

trait NumericSuffix {
    const SUFFIX: &'static str;
}

impl NumericSuffix for i16 {
    const SUFFIX: &'static str = "i16";
}
