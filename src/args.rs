use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Export the SMS report of one campaign", long_about = None)]
pub struct Args {
    /// Login username
    #[arg(short, long, help = "The username used to open the session")]
    pub user: String,

    /// Login password
    #[arg(short, long, help = "The password used to open the session")]
    pub password: String,

    /// Campaign to query
    #[arg(
        short,
        long,
        help = "The campaign identifier appended to API_URL (e.g., '48213')"
    )]
    pub campaign: String,

    /// Output directory
    #[arg(
        short,
        long,
        default_value = ".",
        help = "Directory where the .xlsx files are written"
    )]
    pub out_dir: PathBuf,
}
