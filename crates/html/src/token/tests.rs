use super::*;

fn attrs(list: &[(&str, &str)]) -> Attributes {
    list.iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn tag_names_are_normalized_from_raw() {
    let tag = RawToken::start_tag("<DiV Class=x>");
    assert_eq!(tag.tag_name(), Some("div"));
    let tag = RawToken::end_tag("</TITLE >");
    assert_eq!(tag.tag_name(), Some("title"));
    let tag = RawToken::start_tag("<br/>");
    assert_eq!(tag.tag_name(), Some("br"));
    let tag = RawToken::start_tag("<a\0b>");
    assert_eq!(tag.tag_name(), Some("a\u{FFFD}b"));
    assert_eq!(RawToken::text("x", TextKind::Data).tag_name(), None);
}

#[test]
fn normalize_keeps_non_ascii() {
    assert_eq!(normalize_tag_name("svg"), "svg");
    assert!(matches!(normalize_tag_name("svg"), Cow::Borrowed(_)));
    assert_eq!(normalize_tag_name("ÄBC"), "Äbc");
    assert_eq!(normalize_tag_name("foreignObject"), "foreignobject");
}

#[test]
fn parse_text_tokens() {
    let token = RawToken::text("a &lt; b\r\n", TextKind::Data);
    assert_eq!(
        token.parse(),
        Token::Text {
            value: "a < b\n".to_string()
        }
    );
    let token = RawToken::text("a &lt; b", TextKind::Rawtext);
    assert_eq!(
        token.parse(),
        Token::Text {
            value: "a &lt; b".to_string()
        }
    );
}

#[test]
fn parse_tags_and_markup() {
    assert_eq!(
        RawToken::start_tag("<input TYPE=checkbox checked>").parse(),
        Token::StartTag {
            tag_name: "input".to_string(),
            attributes: attrs(&[("checked", ""), ("type", "checkbox")]),
        }
    );
    assert_eq!(
        RawToken::end_tag("</p>").parse(),
        Token::EndTag {
            tag_name: "p".to_string()
        }
    );
    assert_eq!(
        RawToken::Doctype {
            raw: "<!DOCTYPE html>".to_string()
        }
        .parse(),
        Token::Doctype
    );
    assert_eq!(
        RawToken::Comment {
            raw: "<!-- hi -->".to_string()
        }
        .parse(),
        Token::Comment {
            value: " hi ".to_string()
        }
    );
    assert_eq!(
        RawToken::Garbage {
            raw: "</>".to_string()
        }
        .parse(),
        Token::Garbage {
            raw: "</>".to_string()
        }
    );
}

#[test]
fn conversion_matches_parse() {
    let raw = RawToken::start_tag("<a href='&amp;'>");
    assert_eq!(Token::from(&raw), raw.parse());
}

#[test]
fn raw_accessors() {
    let token = RawToken::start_tag("<p>");
    assert_eq!(token.raw(), "<p>");
    assert_eq!(token.into_raw(), "<p>");
}

#[test]
fn raw_whitespace_split() {
    let token = RawToken::text(" \n&#32;hello ", TextKind::Data);
    assert_eq!(
        token.split_whitespace(),
        (
            Some(RawToken::text(" \n&#32;", TextKind::Data)),
            Some(RawToken::text("hello ", TextKind::Data)),
        )
    );

    let token = RawToken::text("  ", TextKind::Rcdata);
    assert_eq!(
        token.split_whitespace(),
        (Some(RawToken::text("  ", TextKind::Rcdata)), None)
    );

    let token = RawToken::text("&#32;x", TextKind::Rawtext);
    assert_eq!(
        token.split_whitespace(),
        (None, Some(RawToken::text("&#32;x", TextKind::Rawtext)))
    );

    let tag = RawToken::start_tag("<b>");
    assert_eq!(tag.split_whitespace(), (None, Some(tag.clone())));
}

#[test]
fn parsed_whitespace_split() {
    let text = |s: &str| Token::Text {
        value: s.to_string(),
    };
    assert_eq!(
        text("\t\x0C x").split_whitespace(),
        (Some(text("\t\x0C ")), Some(text("x")))
    );
    assert_eq!(text("x ").split_whitespace(), (None, Some(text("x "))));
    assert_eq!(text(" ").split_whitespace(), (Some(text(" ")), None));
    assert_eq!(Token::Doctype.split_whitespace(), (None, Some(Token::Doctype)));
}

#[test]
fn split_halves_decode_like_the_whole() {
    let token = RawToken::text("&#10; &amp;x", TextKind::Data);
    let (before, after) = token.split_whitespace();
    let joined = [before, after]
        .into_iter()
        .flatten()
        .map(|part| match part.parse() {
            Token::Text { value } => value,
            other => panic!("unexpected token {other:?}"),
        })
        .collect::<String>();
    assert_eq!(
        token.parse(),
        Token::Text { value: joined }
    );
}
