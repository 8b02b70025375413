/// Prefix objdump puts in front of each symbol header, eg
/// `TEXT main.main(SB) /home/me/main.go`.
pub const HEADER_PREFIX: &[u8] = b"TEXT ";

/// Characters the analyzer does not accept inside a label.
const LABEL_ILLEGAL: &[u8] = b"()*[]/ .";

/// Turn an objdump symbol descriptor into a label the analyzer accepts.
///
/// Works on raw bytes: the illegal characters are all ASCII, so multi-byte
/// sequences (valid UTF-8 or not) pass through unchanged. Different symbols
/// may mangle to the same label; labels are only markers in the listing and
/// are never resolved.
pub fn mangle(symbol: &[u8]) -> Vec<u8> {
    let mut label: Vec<u8> = symbol
        .iter()
        .map(|&c| if LABEL_ILLEGAL.contains(&c) { b'_' } else { c })
        .collect();
    label.push(b':');
    label
}

/// Returns the symbol descriptor if `line` is a symbol header.
pub fn header_symbol(line: &[u8]) -> Option<&[u8]> {
    line.strip_prefix(HEADER_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mangle_go_signature() {
        assert_eq!(mangle(b"pkg.Func(int)"), b"pkg_Func_int_:");
    }

    #[test]
    fn mangle_objdump_header() {
        assert_eq!(
            mangle(b"golang.org/x/crypto/blake2b.(*Digest).Write(SB) /src/blake2b.go"),
            b"golang_org_x_crypto_blake2b___Digest__Write_SB___src_blake2b_go:"
        );
        assert_eq!(mangle(b"main.f[...]"), b"main_f_____:");
    }

    #[test]
    fn mangle_is_total() {
        assert_eq!(mangle(b""), b":");
        assert_eq!(mangle(b"already_fine"), b"already_fine:");
        // a trailing colon in the input is kept, one more is appended
        assert_eq!(mangle(b"a:"), b"a::");
        assert_eq!(mangle("λ.x".as_bytes()), "λ_x:".as_bytes());
        assert_eq!(mangle(b"f\xe9.g"), b"f\xe9_g:");
    }

    #[test]
    fn mangle_leaves_no_illegal_chars() {
        let input = b"( ) * [ ] / . tab\tstays";
        let out = mangle(input);
        assert!(!out.iter().any(|c| LABEL_ILLEGAL.contains(c)));
        assert_eq!(out.last(), Some(&b':'));
        assert_eq!(out.len(), input.len() + 1);
        assert!(out.contains(&b'\t'));
    }

    #[test]
    fn header_detection() {
        assert_eq!(
            header_symbol(b"TEXT main.main(SB) main.go"),
            Some(&b"main.main(SB) main.go"[..])
        );
        assert_eq!(header_symbol(b"TEXTmain"), None);
        assert_eq!(header_symbol(b" TEXT main"), None);
    }
}
