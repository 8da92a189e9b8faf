//! Instantiation templates for the CC_SERDES primitive, pre-filled with the register file's reset
//! configuration.  Every configurable field becomes a parameter (generic), every input port is tied
//! to zero and every output port is left open.
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::error::Error;
use crate::regfile::{Field, CATALOG};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateFormat {
    Verilog,
    Vhdl,
}

impl TemplateFormat {
    /// `.v` and `.sv` are Verilog, `.vhd` and `.vhdl` are VHDL, in any case.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("v") | Some("sv") => Ok(TemplateFormat::Verilog),
            Some("vhd") | Some("vhdl") => Ok(TemplateFormat::Vhdl),
            _ => Err(Error::UnknownTemplateFormat(path.to_path_buf())),
        }
    }

    fn comment(self) -> &'static str {
        match self {
            TemplateFormat::Verilog => "//",
            TemplateFormat::Vhdl => "--",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Port {
    pub name: &'static str,
    pub width: u8,
}

impl Port {
    pub const fn new(name: &'static str, width: u8) -> Self {
        Self { name, width }
    }

    pub fn is_input(&self) -> bool {
        self.name.ends_with("_I")
    }
}

/// The ports of CC_SERDES, in declaration order
pub const PORTS: &[Port] = &[
    Port::new("TX_DATA_I", 64),
    Port::new("TX_RESET_I", 1),
    Port::new("TX_PCS_RESET_I", 1),
    Port::new("TX_PMA_RESET_I", 1),
    Port::new("PLL_RESET_I", 1),
    Port::new("TX_POWER_DOWN_N_I", 1),
    Port::new("TX_POLARITY_I", 1),
    Port::new("TX_PRBS_SEL_I", 3),
    Port::new("TX_PRBS_FORCE_ERR_I", 1),
    Port::new("TX_8B10B_EN_I", 1),
    Port::new("TX_8B10B_BYPASS_I", 8),
    Port::new("TX_CHAR_IS_K_I", 8),
    Port::new("TX_CHAR_DISPMODE_I", 8),
    Port::new("TX_CHAR_DISPVAL_I", 8),
    Port::new("TX_ELEC_IDLE_I", 1),
    Port::new("TX_DETECT_RX_I", 1),
    Port::new("LOOPBACK_I", 3),
    Port::new("TX_CLK_I", 1),
    Port::new("RX_CLK_I", 1),
    Port::new("RX_RESET_I", 1),
    Port::new("RX_PMA_RESET_I", 1),
    Port::new("RX_EQA_RESET_I", 1),
    Port::new("RX_CDR_RESET_I", 1),
    Port::new("RX_PCS_RESET_I", 1),
    Port::new("RX_BUF_RESET_I", 1),
    Port::new("RX_POWER_DOWN_N_I", 1),
    Port::new("RX_POLARITY_I", 1),
    Port::new("RX_PRBS_SEL_I", 3),
    Port::new("RX_PRBS_CNT_RESET_I", 1),
    Port::new("RX_8B10B_EN_I", 1),
    Port::new("RX_8B10B_BYPASS_I", 8),
    Port::new("RX_EN_EI_DETECTOR_I", 1),
    Port::new("RX_COMMA_DETECT_EN_I", 1),
    Port::new("RX_SLIDE_I", 1),
    Port::new("RX_MCOMMA_ALIGN_I", 1),
    Port::new("RX_PCOMMA_ALIGN_I", 1),
    Port::new("REGFILE_CLK_I", 1),
    Port::new("REGFILE_WE_I", 1),
    Port::new("REGFILE_EN_I", 1),
    Port::new("REGFILE_ADDR_I", 8),
    Port::new("REGFILE_DI_I", 16),
    Port::new("REGFILE_MASK_I", 16),
    Port::new("RX_DATA_O", 64),
    Port::new("RX_NOT_IN_TABLE_O", 8),
    Port::new("RX_CHAR_IS_COMMA_O", 8),
    Port::new("RX_CHAR_IS_K_O", 8),
    Port::new("RX_DISP_ERR_O", 8),
    Port::new("TX_DETECT_RX_DONE_O", 1),
    Port::new("TX_DETECT_RX_PRESENT_O", 1),
    Port::new("TX_BUF_ERR_O", 1),
    Port::new("TX_RESET_DONE_O", 1),
    Port::new("RX_PRBS_ERR_O", 1),
    Port::new("RX_BUF_ERR_O", 1),
    Port::new("RX_BYTE_IS_ALIGNED_O", 1),
    Port::new("RX_BYTE_REALIGN_O", 1),
    Port::new("RX_RESET_DONE_O", 1),
    Port::new("RX_EI_EN_O", 1),
    Port::new("RX_CLK_O", 1),
    Port::new("PLL_CLK_O", 1),
    Port::new("REGFILE_DO_O", 16),
    Port::new("REGFILE_RDY_O", 1),
];

/// Write a CC_SERDES instance for `fields` and `ports`, stamped with `generated`.
pub fn emit<W: Write>(
    out: &mut W,
    format: TemplateFormat,
    fields: &[Field],
    ports: &[Port],
    generated: PrimitiveDateTime,
) -> io::Result<()> {
    let stamp = generated
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        .map_err(io::Error::other)?;
    writeln!(out, "{} CC_SERDES instance generator", format.comment())?;
    writeln!(out, "{} generated: {stamp}", format.comment())?;
    writeln!(out)?;

    let params: Vec<String> = fields
        .iter()
        .filter(|f| f.is_configurable())
        .map(|f| match format {
            TemplateFormat::Verilog => format!(".{}({}'h{:X})", f.name, f.width(), f.reset_value),
            TemplateFormat::Vhdl => format!("{} => {}X\"{:X}\"", f.name, f.width(), f.reset_value),
        })
        .collect();

    let connections: Vec<String> = ports
        .iter()
        .map(|p| match (format, p.is_input()) {
            (TemplateFormat::Verilog, true) => format!(".{}({}'h0)", p.name, p.width),
            (TemplateFormat::Verilog, false) => format!(".{}()", p.name),
            (TemplateFormat::Vhdl, true) if p.width == 1 => format!("{} => '0'", p.name),
            (TemplateFormat::Vhdl, true) => format!("{} => (others => '0')", p.name),
            (TemplateFormat::Vhdl, false) => format!("{} => open", p.name),
        })
        .collect();

    match format {
        TemplateFormat::Verilog => {
            writeln!(out, "CC_SERDES #(")?;
            write_list(out, &params)?;
            writeln!(out, ") i_cc_serdes (")?;
            write_list(out, &connections)?;
            writeln!(out, ");")?;
        }
        TemplateFormat::Vhdl => {
            writeln!(out, "i_cc_serdes: CC_SERDES")?;
            writeln!(out, "generic map (")?;
            write_list(out, &params)?;
            writeln!(out, ")")?;
            writeln!(out, "port map (")?;
            write_list(out, &connections)?;
            writeln!(out, ");")?;
        }
    }
    Ok(())
}

fn write_list<W: Write>(out: &mut W, items: &[String]) -> io::Result<()> {
    for (i, item) in items.iter().enumerate() {
        let sep = if i + 1 == items.len() { "" } else { "," };
        writeln!(out, "    {item}{sep}")?;
    }
    Ok(())
}

/// Write the template for the full catalog to `path`, choosing the language from its extension.
pub fn write_template(path: &Path) -> Result<TemplateFormat, Error> {
    let format = TemplateFormat::from_path(path)?;
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let mut out = BufWriter::new(File::create(path)?);
    emit(&mut out, format, CATALOG, PORTS, PrimitiveDateTime::new(now.date(), now.time()))?;
    out.flush()?;
    tracing::info!("wrote {format:?} template to {}", path.display());
    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regfile::{AccessMode, FieldId};
    use time::macros::datetime;

    fn fields() -> [Field; 4] {
        let f = |name, hi, lo, mode, reset| Field::new(FieldId::RxTapw, name, 0x00, hi, lo, mode, reset);
        [
            f("A", 4, 0, AccessMode::ReadWrite, 3),
            f("B", 5, 5, AccessMode::ReadOnly, 1),
            f("C", 6, 6, AccessMode::WriteSelfClearing, 0),
            f("D", 15, 0, AccessMode::ReadWrite, 0x1C0),
        ]
    }

    const SOME_PORTS: [Port; 4] = [
        Port::new("TX_DATA_I", 64),
        Port::new("TX_RESET_I", 1),
        Port::new("RX_DATA_O", 64),
        Port::new("REGFILE_RDY_O", 1),
    ];

    fn render(format: TemplateFormat, fields: &[Field], ports: &[Port]) -> String {
        let mut out = Vec::new();
        emit(&mut out, format, fields, ports, datetime!(2024-03-01 12:30:05)).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn format_follows_extension() {
        let f = |p: &str| TemplateFormat::from_path(Path::new(p));
        assert_eq!(f("serdes.v").unwrap(), TemplateFormat::Verilog);
        assert_eq!(f("top/serdes.SV").unwrap(), TemplateFormat::Verilog);
        assert_eq!(f("serdes.vhd").unwrap(), TemplateFormat::Vhdl);
        assert_eq!(f("serdes.VHDL").unwrap(), TemplateFormat::Vhdl);
        assert!(matches!(f("serdes.txt"), Err(Error::UnknownTemplateFormat(_))));
        assert!(matches!(f("serdes"), Err(Error::UnknownTemplateFormat(_))));
    }

    #[test]
    fn verilog_instance() {
        insta::assert_snapshot!(render(TemplateFormat::Verilog, &fields(), &SOME_PORTS), @r"
        // CC_SERDES instance generator
        // generated: 2024-03-01 12:30:05

        CC_SERDES #(
            .A(5'h3),
            .C(1'h0),
            .D(16'h1C0)
        ) i_cc_serdes (
            .TX_DATA_I(64'h0),
            .TX_RESET_I(1'h0),
            .RX_DATA_O(),
            .REGFILE_RDY_O()
        );
        ");
    }

    #[test]
    fn vhdl_instance() {
        insta::assert_snapshot!(render(TemplateFormat::Vhdl, &fields(), &SOME_PORTS), @r#"
        -- CC_SERDES instance generator
        -- generated: 2024-03-01 12:30:05

        i_cc_serdes: CC_SERDES
        generic map (
            A => 5X"3",
            C => 1X"0",
            D => 16X"1C0"
        )
        port map (
            TX_DATA_I => (others => '0'),
            TX_RESET_I => '0',
            RX_DATA_O => open,
            REGFILE_RDY_O => open
        );
        "#);
    }

    #[test]
    fn full_catalog_lists_every_configurable_field_and_port() {
        for format in [TemplateFormat::Verilog, TemplateFormat::Vhdl] {
            let text = render(format, CATALOG, PORTS);
            let entries = text.lines().filter(|l| l.starts_with("    ")).count();
            assert_eq!(entries, 205 + PORTS.len());
            assert!(!text.contains(",\n)"));
            assert!(!text.contains("RX_CALIB_DONE"));
            assert!(text.contains("SERDES_TESTMODE"));
        }
    }

    #[test]
    fn ports_table_matches_the_primitive() {
        assert_eq!(PORTS.len(), 61);
        assert_eq!(PORTS.iter().filter(|p| p.is_input()).count(), 42);
        assert!(PORTS.iter().all(|p| p.name.ends_with("_I") || p.name.ends_with("_O")));
    }
}
