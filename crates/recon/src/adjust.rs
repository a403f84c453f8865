use rust_decimal::Decimal;

use crate::matcher::LedgerMatch;
use crate::model::{CanonicalKey, EntryStatus};

/// Synthetic record closing the gap of one amount mismatch.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustmentRecord {
    /// Index of the parent in `MatchOutcome::matches`.
    pub parent: usize,
    pub key: CanonicalKey,
    /// `bank − ledger`; positive when the bank shows more.
    pub amount: Decimal,
    pub bank_amount: Decimal,
    pub ledger_amount: Decimal,
}

impl AdjustmentRecord {
    pub fn remarks(&self) -> String {
        format!(
            "Adjustment for Journal {}: Bank={}, Entry={}, Diff={}",
            self.key, self.bank_amount, self.ledger_amount, self.amount
        )
    }
}

/// One adjustment per `AmountMismatch`, in match order.
pub fn generate_adjustments(matches: &[LedgerMatch<'_>]) -> Vec<AdjustmentRecord> {
    matches
        .iter()
        .enumerate()
        .filter(|(_, m)| m.status == EntryStatus::AmountMismatch)
        .filter_map(|(parent, m)| {
            let ledger_amount = m.ledger_amount()?;
            let bank_amount = m.bank_amount?;
            Some(AdjustmentRecord {
                parent,
                key: m.key.clone(),
                amount: bank_amount - ledger_amount,
                bank_amount,
                ledger_amount,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::parse_amount;
    use crate::config::{KeyTransform, MatchingConfig, ToleranceConfig};
    use crate::filter::{filter_bank, filter_ledger};
    use crate::matcher::match_entries;
    use crate::model::{BankEntry, Fields, LedgerEntry};
    use rust_decimal_macros::dec;

    fn entry(row: usize, id: &str, amount: &str) -> (LedgerEntry, BankEntry) {
        (
            LedgerEntry {
                row,
                identifier: Some(id.into()),
                amount: parse_amount(amount),
                fields: Fields::new(),
            },
            BankEntry {
                row,
                identifier: Some(id.into()),
                amount: parse_amount(amount),
                date: None,
                description: None,
                fields: Fields::new(),
            },
        )
    }

    #[test]
    fn only_mismatches_get_adjustments() {
        let (l1, _) = entry(1, "100", "300.00");
        let (_, b1) = entry(1, "100", "300.00");
        let (l2, _) = entry(2, "200", "9000.00");
        let (_, b2) = entry(2, "200", "12050.00");
        let (l3, _) = entry(3, "300", "500.00");
        let (_, b3) = entry(3, "500", "80.00");
        let (l4, _) = entry(4, "500", "100.00");

        let ledger = vec![l1, l2, l3, l4];
        let bank = vec![b1, b2, b3];
        let fl = filter_ledger(&ledger, KeyTransform::Trim);
        let fb = filter_bank(&bank, KeyTransform::Trim);
        let out = match_entries(&fl, &fb, &MatchingConfig::default(), &ToleranceConfig::default()).unwrap();

        let adjustments = generate_adjustments(&out.matches);
        assert_eq!(adjustments.len(), 2);

        assert_eq!(adjustments[0].parent, 1);
        assert_eq!(adjustments[0].amount, dec!(3050.00));
        assert_eq!(
            adjustments[0].remarks(),
            "Adjustment for Journal 200: Bank=12050.00, Entry=9000.00, Diff=3050.00"
        );

        // bank shows less than the ledger: negative adjustment
        assert_eq!(adjustments[1].parent, 3);
        assert_eq!(adjustments[1].amount, dec!(-20.00));
    }
}
