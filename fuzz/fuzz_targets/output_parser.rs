#![no_main]

use libfuzzer_sys::fuzz_target;
use seedrun::trial::parse_output;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    // NUL separates the stdout half from the stderr half
    let (stdout, stderr) = text.split_once('\0').unwrap_or((&text, ""));
    let _ = parse_output(stdout, stderr);
});
