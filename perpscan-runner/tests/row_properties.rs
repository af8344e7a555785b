//! Property tests for row formatting.

use perpscan_runner::row::{round4, window_label};
use perpscan_runner::{CellValue, ScanRow};
use proptest::prelude::*;

proptest! {
    /// Rounding is idempotent and moves a value by at most half a unit in the 4th place.
    #[test]
    fn round4_is_idempotent_and_close(v in -1e9..1e9_f64) {
        let r = round4(v);
        prop_assert_eq!(round4(r), r);
        prop_assert!((r - v).abs() <= 0.000_05 + 1e-9 * v.abs());
    }

    /// Symbol stays first however many columns are pushed.
    #[test]
    fn symbol_stays_first(values in prop::collection::vec(-1e6..1e6_f64, 0..40)) {
        let mut row = ScanRow::new("BTCUSDT");
        for (i, v) in values.iter().enumerate() {
            row.push_number(format!("c{i}"), *v);
        }
        prop_assert_eq!(row.header()[0], "Symbol");
        prop_assert_eq!(row.symbol(), "BTCUSDT");
        prop_assert_eq!(row.columns().len(), values.len() + 1);
        for (i, v) in values.iter().enumerate() {
            prop_assert_eq!(row.get(&format!("c{i}")), Some(&CellValue::Number(round4(*v))));
        }
    }

    /// Hour-multiple windows render in hours, the rest in minutes.
    #[test]
    fn window_labels(minutes in 1usize..2000) {
        let label = window_label(minutes);
        if minutes % 60 == 0 {
            prop_assert_eq!(label, format!("{}H", minutes / 60));
        } else {
            prop_assert_eq!(label, format!("{minutes}M"));
        }
    }
}
