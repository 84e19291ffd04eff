pub extern crate bincode;
pub extern crate bytes;
pub extern crate tokio_util;

/// Generates a tokio_util codec that carries one bincode-encoded message per
/// length-delimited frame. The length prefix is transport framing only; the
/// payload is a tagged record validated on decode.
#[macro_export]
macro_rules! codec {
    (
    $codec:ident,
    encode: $en_item:ty,
    decode: $de_item:ty
    ) => {
        pub struct $codec {
            len_codec: $crate::macros::codec::tokio_util::codec::LengthDelimitedCodec,
        }

        impl $codec {
            pub fn new() -> Self {
                Self {
                    len_codec: $crate::macros::codec::tokio_util::codec::LengthDelimitedCodec::new(),
                }
            }
        }

        impl Default for $codec {
            fn default() -> Self {
                Self::new()
            }
        }

        const _: () = {
            use $crate::macros::codec::bytes::BytesMut;
            use $crate::macros::codec::tokio_util::codec::{Decoder, Encoder};

            impl Encoder<$en_item> for $codec {
                type Error = anyhow::Error;

                fn encode(&mut self, item: $en_item, dst: &mut BytesMut) -> Result<(), Self::Error> {
                    let msg = $crate::macros::codec::bincode::serialize(&item)?;
                    self.len_codec.encode(msg.into(), dst)?;
                    Ok(())
                }
            }

            impl Decoder for $codec {
                type Item = $de_item;

                type Error = anyhow::Error;

                fn decode(
                    &mut self,
                    src: &mut BytesMut,
                ) -> Result<Option<Self::Item>, Self::Error> {
                    if let Some(bytes) = self.len_codec.decode(src)? {
                        let msg = $crate::macros::codec::bincode::deserialize(&*bytes)?;
                        Ok(Some(msg))
                    } else {
                        Ok(None)
                    }
                }
            }
        };
    };
}
