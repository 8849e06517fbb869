use colored::Colorize;
use lwmachine_driver::FlagKind;
use lwmachine_liquidweb::create_flags;

pub fn handle() {
    println!("{}", "Options for 'lwmachine create':".bold());
    println!();

    for flag in create_flags() {
        let kind = match flag.kind {
            FlagKind::String => "string",
            FlagKind::Int => "int",
        };
        println!(
            "  {} {}  [{}]",
            format!("--{}", flag.name).cyan(),
            kind.dimmed(),
            format!("${}", flag.env_var).dimmed()
        );

        match &flag.default {
            Some(default) => println!("      {} (default: {})", flag.usage, default),
            None => println!("      {}", flag.usage),
        }
    }

    println!(
        "  {} {}  [{}]",
        "--lw-ready-timeout".cyan(),
        "int".dimmed(),
        "$LW_READY_TIMEOUT".dimmed()
    );
    println!("      seconds to wait for the node to become ready (default: 0, no limit)");
}
