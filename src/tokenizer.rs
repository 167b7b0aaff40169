// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concrete line tokenizer (§4.2). The spec treats the tokenizer as an
//! external collaborator specified only by its output contract: split a
//! line into up to `MAX_FIELDS` fields, each tagged `i`/`I`/`m` for
//! addresses the indexer should consume, and ignore everything else.
//! This module is the concrete implementation that contract is built
//! against, grounded in the same whitespace/quote-aware splitting idiom
//! `prospectorengine-prospector-btc`'s CSV-based ingestion uses for field
//! extraction, adapted to plain log lines instead of CSV records.

use crate::address::{classify_token, AddressKind};

/// Hard cap on fields yielded per line (§4.2).
pub const MAX_FIELDS: usize = 1024;

/// One tagged field: its 1-based position in the line and its classified
/// address, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedField {
    pub field_index: u16,
    pub kind: AddressKind,
    pub canonical: String,
}

/// Split `line` into fields and classify each as an address. Quote
/// characters delimit fields unless `greedy` is set (§4.2, §6 `-g`), in
/// which case they are ordinary content and only whitespace splits fields.
///
/// Only fields that classify as an address are returned; other fields are
/// tokenized (so field indices stay stable) but discarded, matching the
/// contract that the indexer "consumes only i/I/m fields".
pub fn tokenize(line: &str, greedy: bool) -> Vec<TaggedField> {
    let mut fields = Vec::new();
    let mut field_index: u16 = 0;
    let mut in_quotes = false;
    let mut current = String::new();

    fn flush(current: &mut String, field_index: &mut u16, fields: &mut Vec<TaggedField>) {
        if current.is_empty() {
            return;
        }
        *field_index += 1;
        if let Some(parsed) = classify_token(current) {
            if fields.len() < MAX_FIELDS {
                fields.push(TaggedField {
                    field_index: *field_index,
                    kind: parsed.kind,
                    canonical: parsed.canonical,
                });
            }
        }
        current.clear();
    }

    for ch in line.chars() {
        if !greedy && (ch == '"' || ch == '\'') {
            in_quotes = !in_quotes;
            if !current.is_empty() {
                flush(&mut current, &mut field_index, &mut fields);
            }
            continue;
        }
        if ch.is_whitespace() && !in_quotes {
            flush(&mut current, &mut field_index, &mut fields);
            continue;
        }
        current.push(ch);
        if field_index as usize >= MAX_FIELDS {
            break;
        }
    }
    flush(&mut current, &mut field_index, &mut fields);

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_fields_with_stable_indices() {
        let fields = tokenize("a 10.0.0.1 b", false);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field_index, 2);
        assert_eq!(fields[0].canonical, "10.0.0.1");
        assert_eq!(fields[0].kind, AddressKind::Ipv4);
    }

    #[test]
    fn mixed_types_keep_field_order() {
        let line = "u 192.168.1.1 v aa:bb:cc:dd:ee:ff w ::1 x";
        let fields = tokenize(line, false);
        let indices: Vec<u16> = fields.iter().map(|f| f.field_index).collect();
        assert_eq!(indices, vec![2, 4, 6]);
    }

    #[test]
    fn greedy_mode_ignores_quotes() {
        let fields = tokenize(r#"a "10.0.0.1" b"#, true);
        // In greedy mode the quotes are ordinary characters, so the quoted
        // address becomes `"10.0.0.1"` which no longer classifies.
        assert!(fields.is_empty());
    }

    #[test]
    fn non_greedy_mode_strips_quotes_around_a_field() {
        let fields = tokenize(r#"a "10.0.0.1" b"#, false);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].canonical, "10.0.0.1");
    }
}
