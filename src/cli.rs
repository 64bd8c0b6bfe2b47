use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};

use jalan_desa::reports::UnitPrices;
use jalan_desa::{Dimension, Selection, SelectionCriteria};

/// Village road condition survey reports
#[derive(Parser, Debug)]
#[command(name = "jalan-desa", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(flatten)]
    pub source: SourceArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, ValueEnum)]
pub enum SourceKind {
    /// Survey export as CSV
    #[default]
    Csv,
    /// Parquet file with the survey columns
    Parquet,
    /// SQLite database table
    Sqlite,
}

#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Survey data file
    #[arg(long, env = "JALAN_DATA", default_value = "DATA_JALAN_DESA.csv", value_hint = ValueHint::FilePath, global = true)]
    pub data: PathBuf,

    /// Kind of data source
    #[arg(long, value_enum, default_value = "csv", global = true)]
    pub source: SourceKind,

    /// Table to read when the source is SQLite
    #[arg(long, env = "JALAN_TABLE", default_value = "data_jalan", global = true)]
    pub table: String,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// District (KABUPATEN), or "all"
    #[arg(long, default_value = "all")]
    pub province: Selection,

    /// Sub-district (KECAMATAN), or "all"
    #[arg(long, default_value = "all")]
    pub sub_region: Selection,

    /// Village (DESA), or "all"
    #[arg(long, default_value = "all")]
    pub village: Selection,

    /// Surface type (JENIS PERKERASAN), or "all"
    #[arg(long, default_value = "all")]
    pub surface: Selection,
}

impl FilterArgs {
    pub fn criteria(&self) -> SelectionCriteria {
        SelectionCriteria {
            province_region: self.province.clone(),
            sub_region: self.sub_region.clone(),
            village: self.village.clone(),
            surface_type: self.surface.clone(),
        }
    }
}

#[derive(Args, Debug, Clone, Copy)]
pub struct PriceArgs {
    /// Repair price per meter, asphalt
    #[arg(long, env = "JALAN_PRICE_ASPHALT", default_value_t = 350_000.0)]
    pub price_asphalt: f64,

    /// Repair price per meter, concrete
    #[arg(long, env = "JALAN_PRICE_CONCRETE", default_value_t = 850_000.0)]
    pub price_concrete: f64,

    /// Repair price per meter, paving block
    #[arg(long, env = "JALAN_PRICE_PAVING", default_value_t = 160_000.0)]
    pub price_paving: f64,
}

impl PriceArgs {
    pub fn unit_prices(&self) -> UnitPrices {
        UnitPrices {
            asphalt: self.price_asphalt,
            concrete: self.price_concrete,
            paving: self.price_paving,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Directory for report files
    #[arg(long, default_value = ".", value_hint = ValueHint::DirPath)]
    pub out_dir: PathBuf,

    /// Rows shown per table preview
    #[arg(long, default_value_t = 5)]
    pub preview_rows: usize,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
pub enum LevelArg {
    Province,
    SubRegion,
    Village,
    Surface,
}

impl LevelArg {
    pub fn dimension(self) -> Dimension {
        match self {
            LevelArg::Province => Dimension::ProvinceRegion,
            LevelArg::SubRegion => Dimension::SubRegion,
            LevelArg::Village => Dimension::Village,
            LevelArg::Surface => Dimension::SurfaceType,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the values a selector may take given its parent selection
    Options {
        #[arg(value_enum)]
        level: LevelArg,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Print statistics and write report tables, summary JSON and map GeoJSON
    Report {
        #[command(flatten)]
        filters: FilterArgs,

        #[command(flatten)]
        prices: PriceArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Write the filtered rows as CSV
    Export {
        #[command(flatten)]
        filters: FilterArgs,

        /// Output file
        #[arg(short, long, default_value = "data_jalan_desa.csv", value_hint = ValueHint::FilePath)]
        output: PathBuf,
    },

    /// Menu-driven session: load once, then filter and report repeatedly
    Interactive {
        #[command(flatten)]
        prices: PriceArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
}
