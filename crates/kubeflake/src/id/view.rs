use core::fmt;

use crate::Layout;

/// A human-readable breakdown of an ID under a [`Layout`].
///
/// Created by [`Layout::describe`]. The `Display` output lists the raw value,
/// its key, the tick start time and a table of the four fields:
///
/// ```text
/// id {
///     raw id     : 0x00000000540540b3 (1409630387)
///     key        : <key>
///     time       : 1700000000.042s since unix epoch
///     layout     :
///         +--------------+--------------+----------------+-----------------+
///         | elapsed (39) | sequence (9) | cluster_id (3) | machine_id (13) |
///         ...
/// }
/// ```
#[derive(Clone, Copy, Debug)]
pub struct IdView<'a> {
    layout: &'a Layout,
    id: u64,
}

impl Layout {
    /// Returns a displayable breakdown of `id`.
    pub const fn describe(&self, id: u64) -> IdView<'_> {
        IdView { layout: self, id }
    }
}

struct Field {
    name: &'static str,
    bits: u8,
    value: u64,
}

impl fmt::Display for IdView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layout = self.layout;
        let parts = layout.decompose(self.id);
        let fields = [
            Field {
                name: "elapsed",
                bits: layout.time_bits(),
                value: parts.elapsed,
            },
            Field {
                name: "sequence",
                bits: layout.sequence_bits(),
                value: parts.sequence,
            },
            Field {
                name: "cluster_id",
                bits: layout.cluster_bits(),
                value: parts.cluster_id,
            },
            Field {
                name: "machine_id",
                bits: layout.machine_bits(),
                value: parts.machine_id,
            },
        ];
        let labels = fields.each_ref().map(|field| format!("{} ({})", field.name, field.bits));
        let widths: [usize; 4] = core::array::from_fn(|i| {
            let dec_len = fields[i].value.to_string().len();
            let hex_len = format!("0x{:x}", fields[i].value).len();
            labels[i].len().max(dec_len).max(hex_len) + 2
        });

        let border = |f: &mut fmt::Formatter<'_>| -> fmt::Result {
            write!(f, "        +")?;
            for w in widths {
                write!(f, "{}+", "-".repeat(w))?;
            }
            writeln!(f)
        };

        let time = layout.time_of(parts.elapsed);
        writeln!(f, "id {{")?;
        writeln!(f, "    raw id     : 0x{:016x} ({})", self.id, self.id)?;
        writeln!(f, "    key        : {}", layout.codec().encode(self.id))?;
        writeln!(
            f,
            "    time       : {}.{:03}s since unix epoch",
            time.as_secs(),
            time.subsec_millis()
        )?;
        writeln!(f, "    layout     :")?;

        border(f)?;
        write!(f, "        |")?;
        for (label, w) in labels.iter().zip(widths) {
            write!(f, "{label:^w$}|")?;
        }
        writeln!(f)?;
        border(f)?;
        write!(f, "        |")?;
        for (field, w) in fields.iter().zip(widths) {
            write!(f, "{:^w$}|", field.value)?;
        }
        writeln!(f)?;
        write!(f, "        |")?;
        for (field, w) in fields.iter().zip(widths) {
            write!(f, "{:^w$}|", format!("0x{:x}", field.value))?;
        }
        writeln!(f)?;
        border(f)?;
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use crate::{Settings, StaticId};

    #[test]
    fn describe_lists_every_field() {
        let epoch = Duration::from_secs(1_700_000_000);
        let layout = Settings::new(StaticId(0), StaticId(0))
            .with_time_unit(Duration::from_millis(1))
            .with_epoch(epoch)
            .validate()
            .unwrap();
        let id = layout
            .compose(epoch + Duration::from_millis(42), 5, 179, 2)
            .unwrap();

        let text = layout.describe(id).to_string();
        assert!(text.starts_with("id {"), "{text}");
        assert!(text.ends_with('}'), "{text}");
        assert!(text.contains(&format!("0x{id:016x}")), "{text}");
        assert!(text.contains(&layout.codec().encode(id)), "{text}");
        assert!(text.contains("1700000000.042s"), "{text}");
        assert!(text.contains("elapsed (39)"), "{text}");
        assert!(text.contains("sequence (9)"), "{text}");
        assert!(text.contains("cluster_id (3)"), "{text}");
        assert!(text.contains("machine_id (13)"), "{text}");
        assert!(text.contains(" 179 "), "{text}");
        assert!(text.contains("0xb3"), "{text}");
    }
}
