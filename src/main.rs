use clap::{Parser, Subcommand};
use picslice::{Dimensions, ProcessConfig, Processor, RustBackend, parse_spec};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "picslice")]
#[command(about = "Parse and process IIIF-style image request specs")]
#[command(long_about = "\
Parse and process IIIF-style image request specs

A spec addresses one derived image:

  identifier/region/size/rotation/quality.format[?query]

  region:   full | square | pct:x,y,w,h | x,y,w,h
  size:     full | max | pct:n | w,h | w, | ,h | !w,h
  rotation: 0
  quality:  default | color
  format:   jpg | png | gif (absent = png)
  query:    trimBorder=0..0.999, autoOrient=true|false

Examples:

  picslice parse 'photo.jpg/square/!400,400/0/default.png'
  picslice render 'photo.jpg/pct:10,10,80,80/max/0/default.jpg' \\
      --input photo.jpg --output out.jpg")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a spec and print the resulting request as JSON
    Parse {
        /// The spec string to parse
        spec: String,
    },
    /// Run the full pipeline against a local image file
    Render {
        /// The spec string describing the transformation
        spec: String,
        /// Source image file
        #[arg(short, long)]
        input: PathBuf,
        /// Destination file for the encoded output
        #[arg(short, long)]
        output: PathBuf,
        /// Maximum output width in pixels
        #[arg(long, default_value_t = 6000)]
        max_width: u32,
        /// Maximum output height in pixels
        #[arg(long, default_value_t = 6000)]
        max_height: u32,
        /// Fuzziness for the border-trim step
        #[arg(long, default_value_t = 0.1)]
        trim_fuzziness: f64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    match cli.command {
        Command::Parse { spec } => {
            let request = parse_spec(&spec)?;
            println!("{}", serde_json::to_string_pretty(&request)?);
        }
        Command::Render {
            spec,
            input,
            output,
            max_width,
            max_height,
            trim_fuzziness,
        } => {
            let request = parse_spec(&spec)?;
            let config = ProcessConfig {
                max_dimensions: Dimensions {
                    width: max_width,
                    height: max_height,
                },
                trim_fuzziness,
            };
            let processor = Processor::with_config(RustBackend::new(), config);
            let mut source = File::open(&input)?;
            let mut sink = BufWriter::new(File::create(&output)?);
            processor.process(&request, &mut source, &mut sink)?;
            sink.flush()?;
            println!("{} -> {}", input.display(), output.display());
        }
    }
    Ok(())
}
