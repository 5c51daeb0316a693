#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use tokio_util::codec::Decoder;

use openwire_core::protocol::OpenWireCodec;

fuzz_target!(|data: &[u8]| {
    let mut codec = OpenWireCodec::new().max_frame_size(64 * 1024);
    let mut buf = BytesMut::from(data);

    loop {
        match codec.decode(&mut buf) {
            Ok(Some(command)) => {
                let _ = command.type_code();
                let _ = command.as_command();
                let _ = command.as_message();
            }
            Ok(None) | Err(_) => break,
        }
    }
});
