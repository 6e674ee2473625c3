/*
    encode.rs - Canonical encoder

    Format (bencode family, self-delimiting):
    - null            n
    - booleans        t / f
    - integer         i<decimal>e
    - byte string     <len>:<bytes>
    - list            l<items>e
    - dictionary      d(<key><value>)*e, keys ascending

    The output is a pure function of the logical value: BTreeMap iteration
    yields keys in byte order and integers are printed without padding.
*/

use super::value::Value;

/// Encode a value into its canonical byte form
pub fn encode(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    encode_into(value, &mut out);
    out
}

/// Append the canonical encoding of `value` to `out`
pub fn encode_into(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Null => out.push(b'n'),
        Value::Bool(true) => out.push(b't'),
        Value::Bool(false) => out.push(b'f'),
        Value::Int(i) => {
            out.push(b'i');
            out.extend_from_slice(i.to_string().as_bytes());
            out.push(b'e');
        }
        Value::Bytes(b) => encode_bytes(b, out),
        Value::List(items) => {
            out.push(b'l');
            for item in items {
                encode_into(item, out);
            }
            out.push(b'e');
        }
        Value::Dict(dict) => {
            out.push(b'd');
            for (key, val) in dict {
                encode_bytes(key.as_bytes(), out);
                encode_into(val, out);
            }
            out.push(b'e');
        }
    }
}

fn encode_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(bytes.len().to_string().as_bytes());
    out.push(b':');
    out.extend_from_slice(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_codec::value::Dict;

    #[test]
    fn test_encode_scalars() {
        assert_eq!(encode(&Value::Null), b"n");
        assert_eq!(encode(&Value::Bool(true)), b"t");
        assert_eq!(encode(&Value::Bool(false)), b"f");
        assert_eq!(encode(&Value::Int(0)), b"i0e");
        assert_eq!(encode(&Value::Int(-42)), b"i-42e");
        assert_eq!(encode(&Value::Int(i64::MIN)), b"i-9223372036854775808e");
        assert_eq!(encode(&Value::from("spam")), b"4:spam");
        assert_eq!(encode(&Value::Bytes(vec![])), b"0:");
    }

    #[test]
    fn test_encode_dict_sorted_by_raw_bytes() {
        let mut dict = Dict::new();
        dict.insert("b".to_string(), Value::Int(2));
        dict.insert("+".to_string(), Value::Int(1));
        dict.insert("a".to_string(), Value::List(vec![Value::Int(1), Value::from("x")]));

        // '+' (0x2b) sorts before 'a' (0x61) and 'b'
        assert_eq!(encode(&Value::Dict(dict)), b"d1:+i1e1:ali1e1:xe1:bi2ee".to_vec());
    }

    #[test]
    fn test_encode_is_deterministic_regardless_of_insert_order() {
        let mut d1 = Dict::new();
        d1.insert("z".to_string(), Value::Int(1));
        d1.insert("a".to_string(), Value::Int(2));

        let mut d2 = Dict::new();
        d2.insert("a".to_string(), Value::Int(2));
        d2.insert("z".to_string(), Value::Int(1));

        assert_eq!(encode(&Value::Dict(d1)), encode(&Value::Dict(d2)));
    }
}
