//! Quote page parsing.
//!
//! All CSS selectors for the quote page live here. They track Google's
//! generated class names and need updating when the page layout changes.

use rust_decimal::{Decimal, RoundingStrategy};
use scraper::{ElementRef, Html, Selector};
use std::str::FromStr;

/// Last traded price.
const PRICE: &str = "div.YMlKec.fxKbKc";

/// Change amount in the page header, e.g. `+2.50 Today`.
const CHANGE_AMOUNT: &str = "span.P2Luy";

/// Change percentage in the page header, e.g. `1.69%`.
const CHANGE_PERCENT: &str = "div.JwB6zf";

/// Combined change text, e.g. `+2.50 (+1.69%)`. Also the value cell of a stats row.
const CHANGE_COMBINED: &str = "div.P6K39c";

/// One row of the key stats table.
const STATS_ROW: &str = "div.gyFHrc";
const STATS_ROW_CLASS: &str = "gyFHrc";
const STATS_LABEL: &str = "div.mfs7Fc";
const STATS_VALUE: &str = "div.P6K39c";

const PREVIOUS_CLOSE_LABEL: &str = "Previous close";

/// Scale of derived change values.
const DERIVED_SCALE: u32 = 8;

/// Figures read from a quote page, before change derivation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PageFigures {
    pub(crate) price: Decimal,
    pub(crate) previous_close: Option<Decimal>,
    pub(crate) raw_change: Option<Decimal>,
    pub(crate) raw_change_percent: Option<Decimal>,
}

impl PageFigures {
    /// Change amount and percentage for the day.
    pub(crate) fn change(&self) -> (Decimal, Decimal) {
        derive_change(
            self.price,
            self.previous_close,
            self.raw_change,
            self.raw_change_percent,
        )
    }
}

/// Reads the figures from a quote page.
///
/// Returns `None` when the page has no usable price: the element is missing,
/// its text does not parse, or the value is negative.
pub(crate) fn extract_figures(html: &str) -> Option<PageFigures> {
    let doc = Html::parse_document(html);

    let price_sel = selector(PRICE)?;
    let price = doc
        .select(&price_sel)
        .next()
        .and_then(|el| normalize_token(&text_of(el)))
        .filter(|price| !price.is_sign_negative())?;

    let (raw_change, raw_change_percent) = raw_change(&doc);

    Some(PageFigures {
        price,
        previous_close: previous_close(&doc),
        raw_change,
        raw_change_percent,
    })
}

/// Computes the change amount and percentage.
///
/// A non-zero previous close is authoritative and overrides the raw tokens.
/// Otherwise a missing side is derived from the other and the price.
pub(crate) fn derive_change(
    price: Decimal,
    previous_close: Option<Decimal>,
    raw_change: Option<Decimal>,
    raw_change_percent: Option<Decimal>,
) -> (Decimal, Decimal) {
    if let Some(prev) = previous_close.filter(|p| !p.is_zero()) {
        let change = price - prev;
        let percent = change
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|n| div_scaled(n, prev))
            .unwrap_or_default();
        return (change, percent);
    }

    match (raw_change, raw_change_percent) {
        (Some(change), Some(percent)) => (change, percent),
        (None, Some(percent)) => {
            let change = price
                .checked_mul(percent)
                .and_then(|n| div_scaled(n, Decimal::ONE_HUNDRED))
                .unwrap_or_default();
            (change, percent)
        }
        (Some(change), None) => {
            let percent = if price.is_zero() {
                Decimal::ZERO
            } else {
                change
                    .checked_mul(Decimal::ONE_HUNDRED)
                    .and_then(|n| div_scaled(n, price))
                    .unwrap_or_default()
            };
            (change, percent)
        }
        (None, None) => (Decimal::ZERO, Decimal::ZERO),
    }
}

/// Divides and rounds half away from zero to [`DERIVED_SCALE`] places.
fn div_scaled(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    numerator
        .checked_div(denominator)
        .map(|q| q.round_dp_with_strategy(DERIVED_SCALE, RoundingStrategy::MidpointAwayFromZero))
}

/// Parses a displayed number such as `$1,234.56`, `+1.69%`, `(2.50)` or `−0.4`.
///
/// Parentheses around the whole token mark a negative value. Unicode minus
/// and dash glyphs count as a minus sign. Everything other than digits, the
/// decimal point and the sign is dropped.
pub(crate) fn normalize_token(raw: &str) -> Option<Decimal> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let (body, parenthesized) = match compact
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        Some(inner) => (inner, true),
        None => (compact.as_str(), false),
    };

    let cleaned: String = body
        .chars()
        .map(|c| if is_dash(c) { '-' } else { c })
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    let (negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.as_str()),
    };
    if digits.is_empty() || digits.contains('-') {
        return None;
    }

    let value = Decimal::from_str(digits).ok()?;
    Some(if negative ^ parenthesized { -value } else { value })
}

const fn is_dash(c: char) -> bool {
    matches!(
        c,
        '-' | '\u{2212}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{FE63}' | '\u{FF0D}'
    )
}

/// Splits combined change text like `+2.50 (+1.69%)` or `+2.50(+1.69%)`
/// into amount and percent.
///
/// A leading parenthesis belongs to the amount (accounting negative).
fn split_combined(text: &str) -> (Option<Decimal>, Option<Decimal>) {
    let text = text.trim();
    let split = text
        .char_indices()
        .skip(1)
        .find(|&(_, c)| c.is_whitespace() || c == '(')
        .map(|(i, _)| i);
    let (head, tail) = match split {
        Some(i) => text.split_at(i),
        None => (text, ""),
    };

    let percent = match (tail.find('('), tail.rfind(')')) {
        (Some(open), Some(close)) if open < close => normalize_token(&tail[open + 1..close]),
        _ => None,
    };
    if percent.is_none() && head.contains('%') {
        return (None, normalize_token(head));
    }
    (normalize_token(head), percent)
}

fn raw_change(doc: &Html) -> (Option<Decimal>, Option<Decimal>) {
    let amount = first_text(doc, CHANGE_AMOUNT).and_then(|text| {
        text.split_whitespace()
            .next()
            .and_then(normalize_token)
    });
    let percent = first_text(doc, CHANGE_PERCENT).and_then(|text| normalize_token(&text));
    if amount.is_some() || percent.is_some() {
        return (amount, percent);
    }

    let Some(combined) = selector(CHANGE_COMBINED) else {
        return (None, None);
    };
    doc.select(&combined)
        .find(|el| !in_stats_row(*el))
        .map(|el| split_combined(&text_of(el)))
        .unwrap_or_default()
}

fn previous_close(doc: &Html) -> Option<Decimal> {
    let row_sel = selector(STATS_ROW)?;
    let label_sel = selector(STATS_LABEL)?;
    let value_sel = selector(STATS_VALUE)?;

    doc.select(&row_sel).find_map(|row| {
        let is_previous_close = row
            .select(&label_sel)
            .any(|label| text_of(label).contains(PREVIOUS_CLOSE_LABEL));
        if !is_previous_close {
            return None;
        }
        row.select(&value_sel)
            .next()
            .and_then(|value| normalize_token(&text_of(value)))
    })
}

fn in_stats_row(el: ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| ancestor.value().classes().any(|c| c == STATS_ROW_CLASS))
}

fn first_text(doc: &Html, css: &str) -> Option<String> {
    let sel = selector(css)?;
    doc.select(&sel).next().map(text_of)
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}
