//! Fuzz target: back-side request decoding.
//!
//! Feeds arbitrary bytes through `protocol::receive_request` until the
//! input runs out.  Every decoded request must re-encode to exactly the
//! bytes it consumed, and unknown command bytes must consume nothing else.
//!
//! cargo fuzz run fuzz_request_decoder

#![no_main]

use doorlock::link::SliceLink;
use doorlock::protocol::{self, Incoming};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut link = SliceLink::new(data);
    loop {
        let before = link.remaining();
        match protocol::receive_request(&mut link) {
            Ok(Incoming::Request(request)) => {
                let consumed = before.len() - link.remaining().len();
                assert_eq!(&before[..consumed], request.encode().as_slice());
            }
            Ok(Incoming::Unknown(byte)) => {
                assert_eq!(before.len() - link.remaining().len(), 1);
                assert!(protocol::Command::from_byte(byte).is_none());
            }
            Err(_) => break,
        }
    }
});
