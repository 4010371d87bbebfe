use colored::Colorize;
use linkmesh::commands::command_argument_builder;
use linkmesh::handlers::{
    handle_analyze, handle_check_config, handle_init, init_tracing, print_banner,
};

fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    init_tracing();

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    let result = match chosen_command.subcommand() {
        Some(("init", primary_command)) => handle_init(primary_command),
        Some(("check-config", primary_command)) => handle_check_config(primary_command),
        Some(("analyze", primary_command)) => handle_analyze(primary_command, quiet),
        None => {
            // No subcommand provided, show usage
            let _ = command_argument_builder().print_help();
            Ok(())
        }
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}
