//! Receipt lines for a fee breakdown

use super::FeeBreakdown;
use crate::core::amount::{format_amount, sub_amounts};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReceiptLineKind {
    OriginalAmount,
    Fee,
    TotalFees,
    DestinationReceives,
    FeeCollector,
}

/// A label/amount pair shown on a transaction receipt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub kind: ReceiptLineKind,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    pub display: String,
}

impl ReceiptLine {
    fn amount(kind: ReceiptLineKind, label: impl Into<String>, amount: Decimal, asset: &str) -> Self {
        Self {
            kind,
            label: label.into(),
            amount: Some(amount),
            display: format_amount(amount, asset),
        }
    }
}

impl FeeBreakdown {
    /// Lines to show on a receipt
    ///
    /// The destination line is `original - total fees` in both cases; only
    /// its wording changes, to tell who economically bears the fee.
    pub fn receipt_lines(&self) -> Vec<ReceiptLine> {
        let asset = self.asset.as_str();
        let mut lines = vec![ReceiptLine::amount(
            ReceiptLineKind::OriginalAmount,
            "Original amount",
            self.original_amount,
            asset,
        )];

        lines.extend(self.applied_fees.iter().map(|fee| {
            ReceiptLine::amount(ReceiptLineKind::Fee, format!("Fee: {}", fee.label), fee.amount, asset)
        }));

        lines.push(ReceiptLine::amount(
            ReceiptLineKind::TotalFees,
            "Total fees",
            self.total_fees,
            asset,
        ));

        let destination_label = if self.is_deductible_from {
            "Destination receives (after fee deduction)"
        } else {
            "Destination pays fee and receives"
        };
        lines.push(ReceiptLine::amount(
            ReceiptLineKind::DestinationReceives,
            destination_label,
            sub_amounts(self.original_amount, self.total_fees),
            asset,
        ));

        if !self.fee_collector.is_empty() {
            lines.push(ReceiptLine {
                kind: ReceiptLineKind::FeeCollector,
                label: "Fees collected by".to_string(),
                amount: None,
                display: self.fee_collectors.join(", "),
            });
        }

        lines
    }
}
