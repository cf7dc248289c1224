#![no_main]

use libfuzzer_sys::fuzz_target;
use seedrun::literal::parse_literal;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Must reject or accept without panicking or overflowing the stack
        let _ = parse_literal(input);
    }
});
