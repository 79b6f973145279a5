use log::{error, info};
use mcstructure::{StringifyOptions, Structure, StructureError, Value};
use std::fs::File;
use std::io::BufReader;
use std::process::ExitCode;

const USAGE: &str = "usage: mcstructure <file> [--namespace] [--states] [--entities] [--json]";

struct Options {
    path: String,
    stringify: StringifyOptions,
    entities: bool,
    json: bool,
}

fn parse_args() -> Option<Options> {
    let mut path = None;
    let mut stringify = StringifyOptions::NAME_ONLY;
    let mut entities = false;
    let mut json = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--namespace" => stringify.with_namespace = true,
            "--states" => stringify.with_states = true,
            "--entities" => entities = true,
            "--json" => json = true,
            flag if flag.starts_with("--") => return None,
            _ if path.is_none() => path = Some(arg.clone()),
            _ => return None,
        }
    }
    Some(Options {
        path: path?,
        stringify,
        entities,
        json,
    })
}

fn print_structure(structure: &Structure, options: &Options) {
    if options.json {
        match serde_json::to_string_pretty(structure.palette()) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Could not render palette: {}", e),
        }
    } else {
        println!("palette:");
        for (index, block) in structure.palette().iter().enumerate() {
            println!("  {:>3}: {}", index, block.stringify(options.stringify));
        }
    }

    let cells = structure.get_str_array(options.stringify);
    for x in 0..structure.size().0 {
        println!("x = {}:", x);
        for row in cells.slice_x(x) {
            println!("  {}", row.join(" | "));
        }
    }

    if options.entities {
        for entity in structure.entities() {
            match Value::try_from(entity) {
                Ok(value) => match serde_json::to_string_pretty(&value) {
                    Ok(json) => println!("{}", json),
                    Err(e) => error!("Could not render entity: {}", e),
                },
                Err(e) => error!("Could not read entity: {}", e),
            }
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = match parse_args() {
        Some(options) => options,
        None => {
            eprintln!("{}", USAGE);
            return ExitCode::FAILURE;
        }
    };

    let structure = match File::open(&options.path)
        .map_err(StructureError::from)
        .and_then(|file| Structure::load(&mut BufReader::new(file)))
    {
        Ok(structure) => structure,
        Err(e) => {
            error!("Could not load {}: {}", options.path, e);
            return ExitCode::FAILURE;
        }
    };

    let special = structure.special_block_indices();
    info!(
        "Loaded {}: size {:?}, {} palette entries, {} with extra data, {} entities",
        options.path,
        structure.size(),
        structure.palette().len(),
        special.len(),
        structure.entities().len()
    );
    let waterlogged = structure.palette().iter().filter(|b| b.is_waterlogged()).count();
    if waterlogged > 0 {
        info!("{} waterlogged palette entries", waterlogged);
    }

    print_structure(&structure, &options);
    ExitCode::SUCCESS
}
