use clap::Parser;
use cut_planner::render;
use cut_planner::solver::Solver;
use cut_planner::types::{DEFAULT_SEED, Demand, PlanOptions, Rect, Strategy};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "cut_planner",
    about = "Plan how to cut rectangular pieces from fixed-size sheets"
)]
struct Cli {
    /// Sheet dimensions (LxW, e.g. 2140x1200)
    #[arg(long)]
    stock: String,

    /// Pieces as LxW:qty (e.g. 800x600:3 400x300:5)
    #[arg(long = "cuts", num_args = 1..)]
    cuts: Vec<String>,

    /// Packing strategy: guillotine or feasibility
    #[arg(long, default_value = "feasibility", value_parser = parse_strategy)]
    strategy: Strategy,

    /// Disable piece rotation
    #[arg(long)]
    no_rotate: bool,

    /// Seed for the group colors
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Show ASCII layout of each sheet
    #[arg(long)]
    layout: bool,

    /// Print the solution as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Log packing decisions to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn parse_strategy(s: &str) -> Result<Strategy, String> {
    match s {
        "guillotine" => Ok(Strategy::Guillotine),
        "feasibility" => Ok(Strategy::Feasibility),
        _ => Err(format!(
            "invalid strategy '{}', expected: guillotine or feasibility",
            s
        )),
    }
}

fn parse_dimensions(s: &str) -> Result<Rect, String> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        return Err(format!("invalid dimensions '{}', expected LxW", s));
    }
    let length = parts[0]
        .parse::<u32>()
        .map_err(|_| format!("invalid length in '{}'", s))?;
    let width = parts[1]
        .parse::<u32>()
        .map_err(|_| format!("invalid width in '{}'", s))?;
    Ok(Rect::new(length, width))
}

fn parse_cut(s: &str) -> Result<Demand, String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err(format!("invalid cut '{}', expected LxW:qty", s));
    }
    let rect = parse_dimensions(parts[0])?;
    let qty = parts[1]
        .parse::<u32>()
        .map_err(|_| format!("invalid quantity in '{}'", s))?;
    Ok(Demand::new(rect, qty))
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let stock = parse_dimensions(&cli.stock).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let demands: Vec<Demand> = cli
        .cuts
        .iter()
        .map(|c| parse_cut(c))
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });

    let options = PlanOptions {
        strategy: cli.strategy,
        allow_rotate: !cli.no_rotate,
        seed: cli.seed,
    };
    let solution = Solver::new(stock, demands, options)
        .solve()
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });

    if cli.json {
        match serde_json::to_string_pretty(&solution) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    for (i, sheet) in solution.plan.sheets.iter().enumerate() {
        println!("Sheet {}:", i + 1);
        for p in &sheet.placements {
            let id = solution
                .groups
                .group_of(p)
                .map(|g| g.id.to_string())
                .unwrap_or_else(|| "?".to_string());
            let rot = if p.rotated { " [rotated]" } else { "" };
            let over = if p.oversized { " [oversized]" } else { "" };
            println!("  ID {}: {} @ ({}, {}){}{}", id, p.rect, p.x, p.y, rot, over);
        }
        if cli.layout {
            print!(
                "{}",
                render::render_sheet(stock, &sheet.placements, &solution.groups)
            );
        }
        println!();
    }

    if !solution.groups.is_empty() {
        println!("Legend:");
        print!("{}", render::render_legend(&solution.groups));
        println!();
    }

    let m = &solution.metrics;
    println!("Total material used: {}", m.total_cut_area);
    println!("Total waste: {} ({:.1}%)", m.waste, m.waste_percent());
    println!(
        "Summary: {} sheet{} used",
        m.sheets_used,
        if m.sheets_used == 1 { "" } else { "s" },
    );
    if m.oversized_pieces > 0 {
        eprintln!(
            "Warning: {} piece{} larger than the {} stock",
            m.oversized_pieces,
            if m.oversized_pieces == 1 { " is" } else { "s are" },
            stock
        );
    }
}
