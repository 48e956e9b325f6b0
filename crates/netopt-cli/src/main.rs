use clap::{Parser, Subcommand};
use netopt_model::{CostComponent, LaneTable, Network, NodeRole, ScenarioConfig};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "netopt")]
#[command(about = "Multi-echelon supply-chain network design optimizer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct ScenarioArgs {
    /// Max demand-weighted transit days into a customer
    #[arg(long, default_value_t = 7.0)]
    service_days: f64,
    /// Carbon price in $ per metric ton of CO2
    #[arg(long, default_value_t = 0.0)]
    carbon_price: f64,
    /// DC safety stock as a fraction of outbound flow
    #[arg(long, default_value_t = 0.0)]
    safety_stock: f64,
    /// Node to force closed (repeatable)
    #[arg(long = "close", value_name = "NODE")]
    closed: Vec<String>,
}

impl ScenarioArgs {
    fn config(&self) -> ScenarioConfig {
        let mut config = ScenarioConfig::new()
            .with_service_days(self.service_days)
            .with_carbon_price(self.carbon_price)
            .with_safety_stock(self.safety_stock);
        for id in &self.closed {
            config = config.with_closed_node(id.clone());
        }
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize a network and print the plan
    Solve {
        /// JSON file with nodes, lanes, demand, and products
        file: PathBuf,
        #[command(flatten)]
        scenario: ScenarioArgs,
        /// Branch-and-bound node limit
        #[arg(long, default_value_t = 10_000)]
        max_nodes: usize,
        /// Output format (json, pretty)
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
    /// Build the model without solving and report its size
    Check {
        /// JSON file with nodes, lanes, demand, and products
        file: PathBuf,
        #[command(flatten)]
        scenario: ScenarioArgs,
    },
    /// Print every lane with its road distance
    Lanes {
        /// JSON file with nodes, lanes, demand, and products
        file: PathBuf,
    },
}

fn load(file: &Path) -> Network {
    let source = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            std::process::exit(1);
        }
    };

    match serde_json::from_str::<Network>(&source) {
        Ok(network) => {
            log::debug!(
                "loaded {} nodes, {} lanes, {} demand rows from {}",
                network.nodes.len(),
                network.lanes.len(),
                network.demand.len(),
                file.display()
            );
            network
        }
        Err(e) => {
            eprintln!("Parse error: {}", e);
            std::process::exit(1);
        }
    }
}

fn prepare_lanes(network: &Network) -> LaneTable {
    match LaneTable::build(&network.nodes, &network.lanes) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Data error: {}", e);
            std::process::exit(1);
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            file,
            scenario,
            max_nodes,
            format,
        } => {
            let network = load(&file);
            let config = scenario.config();
            let lanes = prepare_lanes(&network);

            let formulation = match netopt_model::build(
                &network.nodes,
                &network.demand,
                &lanes,
                &network.products,
                &config,
            ) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Build error: {}", e);
                    std::process::exit(1);
                }
            };

            let solver = netopt_solver::Solver::new().with_max_nodes(max_nodes);
            let solution = match netopt_model::solve(&solver, &formulation) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
            };

            let plan = netopt_model::extract(&formulation, &solution);

            if format == "json" {
                match serde_json::to_string_pretty(&plan) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error writing JSON: {}", e);
                        std::process::exit(1);
                    }
                }
                return;
            }

            println!("Network: {}", file.display());
            println!(
                "Service days: {}  Carbon price: {:.2} $/ton  Safety stock: {:.0}%",
                config.service_days,
                config.carbon_price,
                config.safety_stock * 100.0
            );
            if !config.closed_nodes.is_empty() {
                let closed: Vec<&str> = config.closed_nodes.iter().map(String::as_str).collect();
                println!("Closed: {}", closed.join(", "));
            }
            println!();
            println!("Status: OPTIMAL");
            println!("Total cost: {:.2}", plan.objective);
            println!();

            println!("Cost breakdown:");
            for component in CostComponent::ALL {
                let cost = plan.costs.get(component);
                if cost.abs() > 0.005 {
                    println!("  {:12} {:14.2}", component.as_str(), cost);
                }
            }
            println!();

            println!("Open DCs:");
            if plan.open_dc.is_empty() {
                println!("  (none)");
            }
            for id in &plan.open_dc {
                println!("  {}", id);
            }
            println!();

            println!("Material flows:");
            for f in &plan.flow {
                println!(
                    "  {:10} -> {:10} {:12} t={:<4} {:12.2}",
                    f.from, f.to, f.product, f.period, f.lbs
                );
            }

            if !plan.production.is_empty() {
                println!();
                println!("Production:");
                for r in &plan.production {
                    println!("  {:10} {:12} t={:<4} {:12.2}", r.node, r.product, r.period, r.lbs);
                }
            }

            if !plan.inventory.is_empty() {
                println!();
                println!("Ending inventory:");
                for r in &plan.inventory {
                    println!("  {:10} {:12} t={:<4} {:12.2}", r.node, r.product, r.period, r.lbs);
                }
            }
        }
        Commands::Check { file, scenario } => {
            let network = load(&file);
            let lanes = prepare_lanes(&network);

            match netopt_model::build(
                &network.nodes,
                &network.demand,
                &lanes,
                &network.products,
                &scenario.config(),
            ) {
                Ok(formulation) => {
                    println!("✓ {} is valid", file.display());
                    println!(
                        "  {} suppliers, {} plants, {} DCs, {} customers",
                        network.count_role(NodeRole::Supplier),
                        network.count_role(NodeRole::Plant),
                        network.count_role(NodeRole::DistributionCenter),
                        network.count_role(NodeRole::Customer)
                    );
                    println!(
                        "  {} nodes, {} lanes, {} products, {} periods",
                        network.nodes.len(),
                        lanes.len(),
                        network.products.len(),
                        formulation.periods.len()
                    );
                    println!("  {} open variables", formulation.variables.open.len());
                    println!("  {} flow variables", formulation.variables.flow.len());
                    println!("  {} make variables", formulation.variables.make.len());
                    println!("  {} inventory variables", formulation.variables.inventory.len());
                    println!("  {} constraints", formulation.problem.num_constraints());
                }
                Err(e) => {
                    eprintln!("✗ {} has errors:", file.display());
                    eprintln!("  {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Lanes { file } => {
            let network = load(&file);
            let lanes = prepare_lanes(&network);

            for routed in lanes.iter() {
                let lane = &routed.lane;
                let transit = lane
                    .transit_days
                    .map_or_else(|| "-".to_string(), |d| format!("{}", d));
                println!(
                    "  {:10} -> {:10} {:10.1} mi  {:>4} days",
                    lane.from, lane.to, routed.distance_mi, transit
                );
            }
        }
    }
}
