#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };
    let (parsed, _) = authz_http::parse_path_and_query(raw);
    for segment in &parsed.segments {
        let _ = segment.len();
    }
    let _ = parsed.query.len();
});
