//! Cart summary

use std::{fmt::Write, io, num::NonZeroU32};

use rusty_money::{Money, iso::Currency};
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    items::{LineItem, LineItemId, LineItemKind},
    pricing::{OrderSummary, PricingError, calculate_order_summary, order_item_pricing},
};

/// Errors that can occur when building or printing a cart summary.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// An item could not be priced.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// IO error
    #[error("IO error")]
    IO,
}

/// One priced row of the summary.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryLine<'a> {
    /// Line item id
    pub id: LineItemId,

    /// Product name, or the reformed tie
    pub label: String,

    /// Option, measurement and coupon details
    pub detail: String,

    /// Price of one unit before discount
    pub unit_price: Money<'a, Currency>,

    /// Discount on one unit
    pub discount: Money<'a, Currency>,

    /// Units ordered
    pub quantity: NonZeroU32,

    /// `(unit_price - discount) * quantity`
    pub line_total: Money<'a, Currency>,
}

/// Priced view of a cart, ready to print.
#[derive(Debug, Clone)]
pub struct CartSummary<'a> {
    lines: Vec<SummaryLine<'a>>,
    summary: OrderSummary<'a>,
}

impl<'a> CartSummary<'a> {
    /// Prices every item in `items`.
    ///
    /// # Errors
    ///
    /// Returns a [`SummaryError::Pricing`] if any item cannot be priced in `currency`.
    pub fn from_items(items: &[LineItem<'a>], currency: &'a Currency) -> Result<Self, SummaryError> {
        let summary = calculate_order_summary(items, currency)?;

        let lines = items
            .iter()
            .map(summary_line)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { lines, summary })
    }

    /// Priced rows, in cart order.
    #[must_use]
    pub fn lines(&self) -> &[SummaryLine<'a>] {
        &self.lines
    }

    /// Cart totals.
    #[must_use]
    pub fn totals(&self) -> &OrderSummary<'a> {
        &self.summary
    }

    /// Prints the summary table followed by the totals.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError::IO`] if writing to `out` fails.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), SummaryError> {
        if self.lines.is_empty() {
            return writeln!(out, "\n Your cart is empty.\n").map_err(|_err| SummaryError::IO);
        }

        let mut builder = Builder::default();

        builder.push_record(["Item", "Detail", "Unit Price", "Discount", "Qty", "Line Total"]);

        for line in &self.lines {
            builder.push_record([
                line.label.clone(),
                line.detail.clone(),
                line.unit_price.to_string(),
                discount_cell(&line.discount),
                line.quantity.to_string(),
                line.line_total.to_string(),
            ]);
        }

        let mut table = builder.build();
        let mut theme = Theme::from(Style::modern_rounded());

        theme.remove_horizontal_lines();
        theme.insert_horizontal_line(
            1,
            HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤')),
        );

        table.with(theme);
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Columns::new(2..6), Alignment::right());

        writeln!(out, "\n{}", dim_borders(&table.to_string())).map_err(|_err| SummaryError::IO)?;

        self.write_totals(&mut out)
    }

    fn write_totals(&self, out: &mut impl io::Write) -> Result<(), SummaryError> {
        let totals = &self.summary.totals;

        let rows = [
            (" Subtotal:", totals.original_price.to_string()),
            (" Discount:", format!("-{}", totals.total_discount)),
            (" Total:", totals.total_price.to_string()),
            (" Items:", self.summary.total_quantity.to_string()),
        ];

        let label_width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
        let value_width = rows.iter().map(|(_, value)| value.chars().count()).max().unwrap_or(0);

        for (label, value) in &rows {
            writeln!(out, "{label:>label_width$}  {value:>value_width$}")
                .map_err(|_err| SummaryError::IO)?;
        }

        writeln!(out).map_err(|_err| SummaryError::IO)
    }
}

fn summary_line<'a>(item: &LineItem<'a>) -> Result<SummaryLine<'a>, PricingError> {
    let pricing = order_item_pricing(item)?;
    let quantity = item.quantity();

    let line_total = pricing.line_total(quantity)?;

    let (label, mut detail) = match item.kind() {
        LineItemKind::Product {
            product,
            selected_option,
        } => (
            product.name.clone(),
            selected_option
                .as_ref()
                .map(|option| option.name.clone())
                .unwrap_or_default(),
        ),
        LineItemKind::Reform(reform) => (
            format!("Reform ({})", reform.tie.id),
            reform.tie.measurement.to_string(),
        ),
    };

    if let Some(applied) = item.applied_coupon() {
        if !detail.is_empty() {
            detail.push('\n');
        }

        _ = write!(detail, "coupon: {}", applied.coupon.name);
    }

    Ok(SummaryLine {
        id: item.id().clone(),
        label,
        detail,
        unit_price: pricing.unit_price,
        discount: pricing.discount,
        quantity,
        line_total,
    })
}

fn discount_cell(discount: &Money<'_, Currency>) -> String {
    if discount.is_zero() {
        String::new()
    } else {
        format!("-{discount}")
    }
}

/// Wraps runs of box-drawing characters in ANSI dark grey.
fn dim_borders(table: &str) -> String {
    let mut out = String::with_capacity(table.len() + 256);
    let mut in_run = false;

    for ch in table.chars() {
        let box_char = ('\u{2500}'..='\u{257F}').contains(&ch);

        if box_char && !in_run {
            out.push_str("\x1b[90m");
            in_run = true;
        } else if !box_char && in_run {
            out.push_str("\x1b[0m");
            in_run = false;
        }

        out.push(ch);
    }

    if in_run {
        out.push_str("\x1b[0m");
    }

    out
}
