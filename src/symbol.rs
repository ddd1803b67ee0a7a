// UI symbol (`BTCUSD`) to Kraken wire pair (`XBT/USD`). Unmapped symbols
// pass through normalized.
const UI_TO_WIRE: &[(&str, &str)] = &[
    ("BTCUSD", "XBT/USD"),
    ("ETHUSD", "ETH/USD"),
    ("LTCUSD", "LTC/USD"),
    ("XRPUSD", "XRP/USD"),
    ("SOLUSD", "SOL/USD"),
    ("ADAUSD", "ADA/USD"),
    ("DOGEUSD", "XDG/USD"),
    ("BTCEUR", "XBT/EUR"),
    ("ETHEUR", "ETH/EUR"),
];

// Keyed by the separator-free wire form.
const WIRE_TO_UI: &[(&str, &str)] = &[
    ("XBTUSD", "BTCUSD"),
    ("XXBTZUSD", "BTCUSD"),
    ("ETHUSD", "ETHUSD"),
    ("XETHZUSD", "ETHUSD"),
    ("LTCUSD", "LTCUSD"),
    ("XRPUSD", "XRPUSD"),
    ("SOLUSD", "SOLUSD"),
    ("ADAUSD", "ADAUSD"),
    ("XDGUSD", "DOGEUSD"),
    ("XBTEUR", "BTCEUR"),
    ("ETHEUR", "ETHEUR"),
];

/// Uppercase and strip `/`, `-`, `_`, `.`, `:` and whitespace.
pub fn normalize(symbol: &str) -> String {
    symbol
        .chars()
        .filter(|c| !matches!(c, '/' | '-' | '_' | '.' | ':') && !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

pub fn to_wire_symbol(ui_symbol: &str) -> String {
    let key = normalize(ui_symbol);
    UI_TO_WIRE
        .iter()
        .find(|(ui, _)| *ui == key)
        .map(|(_, wire)| (*wire).to_string())
        .unwrap_or(key)
}

pub fn from_wire_symbol(wire_symbol: &str) -> String {
    let key = normalize(wire_symbol);
    WIRE_TO_UI
        .iter()
        .find(|(wire, _)| *wire == key)
        .map(|(_, ui)| (*ui).to_string())
        .unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_pairs_round_trip() {
        for (ui, _) in UI_TO_WIRE {
            assert_eq!(from_wire_symbol(&to_wire_symbol(ui)), *ui);
        }
    }

    #[test]
    fn unknown_symbols_pass_through_normalized() {
        assert_eq!(to_wire_symbol(" aapl "), "AAPL");
        assert_eq!(from_wire_symbol("dot/usd"), "DOTUSD");
    }

    #[test]
    fn separators_are_ignored_on_both_sides() {
        assert_eq!(to_wire_symbol("btc-usd"), "XBT/USD");
        assert_eq!(to_wire_symbol("eth/usd"), "ETH/USD");
        assert_eq!(from_wire_symbol("xbt_usd"), "BTCUSD");
    }
}
