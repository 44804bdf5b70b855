//! `AuthenticationXXX` (`spec.md` §4.3): the backend's authentication
//! challenge/acceptance message, distinguished by a 4-byte sub-code.

use bytes::{Buf, Bytes};

use crate::error::{err_protocol, Error};
use crate::io::buf_ext::BufExt;
use crate::message::{BackendMessage, BackendMessageFormat};

#[derive(Debug, Clone)]
pub enum Authentication {
    Ok,
    CleartextPassword,
    Md5Password { salt: [u8; 4] },
    Sasl { mechanisms: Vec<String> },
    SaslContinue { data: Bytes },
    SaslFinal { data: Bytes },
}

impl BackendMessage for Authentication {
    const FORMAT: BackendMessageFormat = BackendMessageFormat::Authentication;

    fn decode_body(mut buf: Bytes) -> Result<Self, Error> {
        let sub_code = buf.get_i32_be()?;
        Ok(match sub_code {
            0 => Authentication::Ok,
            3 => Authentication::CleartextPassword,
            5 => {
                if buf.remaining() < 4 {
                    return Err(err_protocol!("AuthenticationMD5Password: missing salt"));
                }
                let mut salt = [0u8; 4];
                buf.copy_to_slice(&mut salt);
                Authentication::Md5Password { salt }
            }
            10 => {
                let mut mechanisms = Vec::new();
                while buf.has_remaining() {
                    let name = buf.get_cstr()?;
                    if name.is_empty() {
                        break;
                    }
                    mechanisms.push(name);
                }
                Authentication::Sasl { mechanisms }
            }
            11 => Authentication::SaslContinue { data: buf },
            12 => Authentication::SaslFinal { data: buf },
            other => {
                return Err(err_protocol!(
                    "unsupported authentication sub-message code {other}"
                ))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BufMut;

    #[test]
    fn decodes_ok() {
        let mut buf = Vec::new();
        buf.put_i32(0);
        let msg = Authentication::decode_body(Bytes::from(buf)).unwrap();
        assert!(matches!(msg, Authentication::Ok));
    }

    #[test]
    fn decodes_sasl_mechanism_list() {
        let mut buf = Vec::new();
        buf.put_i32(10);
        buf.extend_from_slice(b"SCRAM-SHA-256\0");
        buf.push(0);
        let msg = Authentication::decode_body(Bytes::from(buf)).unwrap();
        match msg {
            Authentication::Sasl { mechanisms } => {
                assert_eq!(mechanisms, vec!["SCRAM-SHA-256".to_string()])
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
