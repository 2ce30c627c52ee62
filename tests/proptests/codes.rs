//! Property-Based Tests: Code Table
//!
//! Arbitrary replacement tables are merged onto the standard table. Whatever
//! the input, the system codes must keep their meaning and every rejected
//! code must be one outside the replaceable range.

#[cfg(test)]
mod tests {
    use fractal_notify::codes::SYSTEM_CODES;
    use fractal_notify::{CodeEntry, CodeTable};
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn entry() -> impl Strategy<Value = CodeEntry> {
        ("[A-Z]{3}", "[A-Za-z]{1,20}").prop_map(|(severity, label)| CodeEntry::new(severity, label))
    }

    proptest! {
        /// **Property:** merging never disturbs the system codes and rejects
        /// exactly the out-of-range codes.
        #[test]
        fn test_merge_respects_range(
            replacement in prop::collection::vec((-50i32..1100, entry()), 0..40)
        ) {
            let standard = CodeTable::standard();
            let mut table = standard.clone();
            let rejected = table.merge(replacement.clone());

            for code in SYSTEM_CODES {
                prop_assert_eq!(table.system(code), standard.system(code));
            }

            let mut expected: Vec<i32> = replacement
                .iter()
                .map(|(code, _)| *code)
                .filter(|code| !CodeTable::is_replaceable(*code))
                .collect();
            expected.sort_unstable();
            prop_assert_eq!(rejected, expected);

            // last write wins for accepted codes
            let mut accepted = HashMap::new();
            for (code, entry) in &replacement {
                if CodeTable::is_replaceable(*code) {
                    accepted.insert(*code, entry);
                }
            }
            for (code, entry) in accepted {
                prop_assert_eq!(table.lookup(code), Some(entry));
            }
        }
    }
}
