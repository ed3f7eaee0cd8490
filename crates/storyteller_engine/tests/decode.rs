use pretty_assertions::assert_eq;
use storyteller_engine::{decode_text, DecodeError};

#[test]
fn plain_utf8_is_kept() {
    let decoded = decode_text("Umsatz stieg um 4 %, Kosten fielen.".as_bytes(), None).unwrap();
    assert_eq!(decoded.encoding_label, "UTF-8");
    assert_eq!(decoded.text, "Umsatz stieg um 4 %, Kosten fielen.");
}

#[test]
fn byte_order_mark_wins_over_declared_charset() {
    let bytes = [0xEF, 0xBB, 0xBF, b'o', b'k'];
    let decoded = decode_text(&bytes, Some("text/plain; charset=windows-1252")).unwrap();
    assert_eq!(decoded.encoding_label, "UTF-8");
    assert_eq!(decoded.text, "ok");
}

#[test]
fn declared_charset_is_honoured() {
    let bytes = b"caf\xe9 cr\xe8me";
    let decoded = decode_text(bytes, Some("text/plain; charset=\"ISO-8859-1\"")).unwrap();
    assert_eq!(decoded.encoding_label, "windows-1252");
    assert_eq!(decoded.text, "café crème");
}

#[test]
fn invalid_bytes_for_declared_charset_fail() {
    let err = decode_text(b"ok \xc3\x28", Some("text/plain; charset=utf-8")).unwrap_err();
    assert_eq!(
        err,
        DecodeError::DecodeFailure {
            encoding: "UTF-8".into(),
            message: "invalid byte sequence".into(),
        }
    );
}
