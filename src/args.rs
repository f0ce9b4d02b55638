use clap::Parser;

/// This is an attendee selection program for events with limited places.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The file containing the session configuration in JSON format.
    /// For more information about the file format, read the manual of the attendee_selection crate.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path, optional) A JSON array of students to use as the student database. If not
    /// provided, the built-in database is used.
    #[clap(long, value_parser)]
    pub roster: Option<String>,

    /// (file path) The sign-up file. It must be a CSV file. Setting this option overrides
    /// what may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub signup: Option<String>,

    /// (file path, optional) The historical database file. It must be a CSV file.
    #[clap(long, value_parser)]
    pub historical: Option<String>,

    /// The name of the event.
    #[clap(short = 'n', long, value_parser)]
    pub event_name: Option<String>,

    /// (positive integer) The number of places.
    #[clap(short = 'k', long, value_parser)]
    pub capacity: Option<String>,

    /// (YYYY-MM-DD, default today) The date of the event. It is recorded as the attendance
    /// date in the updated database.
    #[clap(long, value_parser)]
    pub event_date: Option<String>,

    /// (integer, optional) A seed to make the draw reproducible.
    #[clap(long, value_parser)]
    pub seed: Option<u64>,

    /// (default uniform) How the eligible students are ordered: 'uniform' or 'priority'.
    #[clap(long, value_parser)]
    pub mode: Option<String>,

    /// (text, optional) Only show the students matching this text in the database listing.
    #[clap(long, value_parser)]
    pub search: Option<String>,

    /// (directory path, 'stdout' or empty) If specified, the exports are written to the given
    /// directory, or printed. Setting this option overrides the directory that may be specified
    /// with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file for the selected attendees export. If provided, eventraffle
    /// will check that the export matches the reference. Only meaningful with --seed.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
