use std::sync::OnceLock;

use regex::Regex;
use reckon_core::{parse_amount, round_cents, Receipt, ReceiptDraft, ReceiptLineItem};
use tracing::{debug, info};

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

// Amounts use ASCII digits only; `parse_amount` and `str::parse` reject others.
re!(re_price,
    r"\$?\s*([0-9]{1,4}\.[0-9]{2})");
re!(re_qty_price,
    r"([0-9]+)\s*[@xX]\s*\$?([0-9]+\.[0-9]{2})");

re!(re_total,
    r"(?i)\b(?:total|grand\s*total)[\s:]*\$?\s*([0-9]+\.[0-9]{2})");
re!(re_tax,
    r"(?i)\b(?:tax|gst|vat)[\s:]*\$?\s*([0-9]+\.[0-9]{2})");
re!(re_subtotal,
    r"(?i)\b(?:subtotal|sub\s*total)[\s:]*\$?\s*([0-9]+\.[0-9]{2})");

re!(re_date,
    r"(?i)(\d{1,2}[/-]\d{1,2}[/-]\d{2,4}|\d{4}[/-]\d{1,2}[/-]\d{1,2}|(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)\w*\s+\d{1,2},?\s+\d{4})");

// Lines that never name the store.
re!(re_store_noise,
    r"(?i)(?:receipt|invoice|total|subtotal|tax|item|qty|price|amount|date|time|thank|www\.|\.com)");

// Lines that never carry a purchased item: payment, loyalty, ordering, contact.
re!(re_item_noise,
    r"(?i)(?:total|subtotal|tax|change|cash|visa|mastercard|card|thank|receipt|store|phone|address|www|\.com|approved|balance|loyalty|points|member|server|table|order|check|ticket|transaction|authorization|ref\s*#)");

re!(re_name_junk,
    r"[^\w\s\-&'()]");
re!(re_whitespace,
    r"\s+");

/// Prices at or outside these bounds are phone numbers, zip codes and the like.
const MIN_LINE_PRICE: f64 = 0.01;
const MAX_LINE_PRICE: f64 = 10_000.0;

const STORE_SCAN_LINES: usize = 5;

// ── Public extraction API ─────────────────────────────────────────────────────

/// Heuristic parser for unstructured receipt text.
pub struct TextExtractor;

impl TextExtractor {
    /// Build a canonical receipt from raw text. Anything the heuristics miss
    /// falls back to a default; this never fails.
    pub fn extract(text: &str) -> Receipt {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        let store_name = Self::extract_store_name(&lines);
        let date = Self::extract_date(text);
        let subtotal = Self::extract_subtotal(text);
        let tax = Self::extract_tax(text);
        let total = Self::extract_total(text);
        let items = Self::extract_items(&lines);

        info!(
            chars = text.len(),
            items = items.len(),
            "parsed receipt from raw text"
        );

        Receipt::from_draft(ReceiptDraft {
            items,
            subtotal,
            tax,
            total,
            store_name,
            date,
            raw_source_text: Some(text.to_string()),
        })
    }

    // ── Store name ────────────────────────────────────────────────────────────

    fn extract_store_name(lines: &[&str]) -> Option<String> {
        lines
            .iter()
            .take(STORE_SCAN_LINES)
            .find(|l| {
                l.chars().count() > 3 && !re_store_noise().is_match(l) && !re_price().is_match(l)
            })
            .map(|l| title_case(l))
    }

    // ── Date ─────────────────────────────────────────────────────────────────

    fn extract_date(text: &str) -> Option<String> {
        re_date().find(text).map(|m| m.as_str().to_string())
    }

    // ── Amounts ───────────────────────────────────────────────────────────────

    fn extract_subtotal(text: &str) -> f64 {
        first_labeled_amount(re_subtotal(), text, |_| true)
    }

    fn extract_tax(text: &str) -> f64 {
        first_labeled_amount(re_tax(), text, |_| true)
    }

    /// A `total` label directly preceded by `sub` ("Sub Total") is a
    /// subtotal and is skipped.
    fn extract_total(text: &str) -> f64 {
        first_labeled_amount(re_total(), text, |before| !ends_with_sub(before))
    }

    // ── Line items ────────────────────────────────────────────────────────────

    fn extract_items(lines: &[&str]) -> Vec<ReceiptLineItem> {
        lines
            .iter()
            .filter(|line| {
                let noisy = re_item_noise().is_match(line);
                if noisy {
                    debug!(line = %line, "skipping non-item line");
                }
                !noisy
            })
            .filter_map(|line| Self::quantity_price_item(line).or_else(|| Self::trailing_price_item(line)))
            .collect()
    }

    /// `"Lays Chips 2 @ $1.99"` or `"Soda 3x 0.99"`.
    fn quantity_price_item(line: &str) -> Option<ReceiptLineItem> {
        let c = re_qty_price().captures(line)?;
        let quantity: f64 = c.get(1)?.as_str().parse().ok()?;
        let unit_price = parse_amount(c.get(2)?.as_str())?;

        let prefix = line[..c.get(0)?.start()].trim();
        let name = if prefix.is_empty() { "Item" } else { prefix };

        Some(ReceiptLineItem::new(
            clean_item_name(name),
            quantity,
            unit_price,
            round_cents(quantity * unit_price),
        ))
    }

    /// `"Cheddar Cheese   $5.99"`: the last amount on the line is the price.
    fn trailing_price_item(line: &str) -> Option<ReceiptLineItem> {
        let price = re_price()
            .captures_iter(line)
            .filter_map(|c| c.get(1))
            .last()
            .and_then(|m| parse_amount(m.as_str()))?;

        let stripped = re_price().replace_all(line, "");
        let name = stripped.trim().trim_end_matches('$').trim();

        if name.is_empty() || price <= MIN_LINE_PRICE || price >= MAX_LINE_PRICE {
            debug!(line = %line, price, "rejecting trailing-price candidate");
            return None;
        }

        Some(ReceiptLineItem::new(clean_item_name(name), 1.0, price, price))
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// First match of `pattern` whose preceding text passes `accept`, or 0.0.
fn first_labeled_amount(pattern: &Regex, text: &str, accept: impl Fn(&str) -> bool) -> f64 {
    pattern
        .captures_iter(text)
        .filter(|c| c.get(0).is_some_and(|m| accept(&text[..m.start()])))
        .find_map(|c| parse_amount(c.get(1)?.as_str()))
        .unwrap_or(0.0)
}

/// Whether `before`, ignoring trailing whitespace, ends in "sub" (any case).
/// Only the tail is inspected, so scanning many labels stays linear.
fn ends_with_sub(before: &str) -> bool {
    let trimmed = before.trim_end();
    trimmed
        .char_indices()
        .rev()
        .nth(2)
        .is_some_and(|(start, _)| trimmed[start..].eq_ignore_ascii_case("sub"))
}

/// Drop punctuation, collapse whitespace and title-case an item name.
pub fn clean_item_name(name: &str) -> String {
    let kept = re_name_junk().replace_all(name, "");
    let collapsed = re_whitespace().replace_all(kept.trim(), " ");
    if collapsed.is_empty() {
        "Unknown Item".to_string()
    } else {
        title_case(&collapsed)
    }
}

/// Upper-case the first letter of every word and lower-case the rest, where a
/// word starts after any character that has no case (digits and apostrophes
/// included, so `"2nd"` becomes `"2Nd"`).
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_cased = false;
    for c in s.chars() {
        if prev_cased {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        prev_cased = c.is_lowercase() || c.is_uppercase();
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
