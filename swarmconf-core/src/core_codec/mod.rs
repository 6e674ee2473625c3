/*
    core_codec - Canonical encoding of the config value tree

    Two logically equal trees always encode to identical bytes, and decode
    accepts nothing but that unique encoding. Snapshot hashes are taken over
    these bytes, so they are comparable and dedupe-able across devices.
*/

pub mod decode;
pub mod defaults;
pub mod encode;
pub mod value;

pub use decode::{decode, decode_with_limits, DecodeLimits};
pub use defaults::FieldRule;
pub use encode::{encode, encode_into};
pub use value::{Dict, Value};

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::Int),
            prop::collection::vec(any::<u8>(), 0..24).prop_map(Value::Bytes),
        ];
        leaf.prop_recursive(4, 48, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::List),
                prop::collection::btree_map("[a-z+#@!&~<]{0,4}", inner, 0..6).prop_map(Value::Dict),
            ]
        })
    }

    proptest! {
        // Property: decode(encode(T)) == T
        #[test]
        fn prop_decode_inverts_encode(value in arb_value()) {
            let bytes = encode(&value);
            prop_assert_eq!(decode(&bytes).unwrap(), value);
        }

        // Property: for any accepted b, encode(decode(b)) == b
        #[test]
        fn prop_accepted_bytes_are_canonical(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
            if let Ok(value) = decode(&bytes) {
                prop_assert_eq!(encode(&value), bytes);
            }
        }

        // Property: mutating a canonical encoding never yields a second
        // accepted encoding of the same value
        #[test]
        fn prop_no_alternate_encodings(value in arb_value(), index in any::<prop::sample::Index>(), byte in any::<u8>()) {
            let mut bytes = encode(&value);
            let i = index.index(bytes.len());
            bytes[i] = byte;
            if let Ok(other) = decode(&bytes) {
                prop_assert_eq!(encode(&other), bytes);
            }
        }
    }
}
