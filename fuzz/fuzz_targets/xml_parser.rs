#![no_main]
use libfuzzer_sys::fuzz_target;
use tidyxml::{to_string, Parser, WorkerPool};

fuzz_target!(|data: &[u8]| {
    if let Ok(mut root) = Parser::new(data).parse() {
        if let Ok(pool) = WorkerPool::new(2) {
            let _ = to_string(&mut root, &pool);
        }
    }
});
