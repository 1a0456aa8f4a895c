use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("chartwise")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Turn web pages into LLM-generated tables, charts and reports")
        .arg(clap::arg!(<INPUT> "URL to fetch, local HTML file, or '-' for stdin"))
        .arg(clap::arg!(-p --prompt <PROMPT> "Question for the model; without it the scraped text is printed"))
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--json "Print the full report as JSON"))
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds").default_value("10"))
        .arg(clap::arg!(--"user-agent" <UA> "Custom User-Agent for HTTP requests").value_name("UA"))
        .arg(clap::arg!(--endpoint <URL> "Ollama server URL").default_value("http://localhost:11434"))
        .arg(clap::arg!(-m --model <NAME> "Model name").default_value("mistral"))
        .arg(clap::arg!(--"model-timeout" <SECS> "Model request timeout in seconds").default_value("120"))
        .arg(clap::arg!(--"content-limit" <NUM> "Characters of page text sent to the model").default_value("2000"))
        .arg(
            clap::arg!(--"table-mode" <MODE> "Table extraction mode")
                .default_value("pipe")
                .value_parser(["pipe", "single"]),
        )
        .arg(clap::arg!(--"max-charts" <NUM> "Maximum number of charts to render").default_value("2"))
        .arg(clap::arg!(--"brand-counts" "Chart brand frequencies of the first table"))
        .arg(clap::arg!(--"brand-column" <NAME> "Column aggregated by --brand-counts"))
        .arg(
            clap::arg!(--"output-dir" <DIR> "Directory for charts and PDFs")
                .default_value("static/charts")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(--font <FILE> "TrueType font used for chart text")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--"no-pdf" "Skip the table and report PDFs"))
        .arg(clap::arg!(--screenshot "Capture a page screenshot with headless Chrome"))
        .arg(clap::arg!(--chrome <PATH> "Chrome/Chromium binary used for screenshots"))
        .arg(clap::arg!(-v --verbose "Enable debug logging"));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "chartwise", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "chartwise", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "chartwise", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "chartwise", &completions_dir).unwrap();

    println!("cargo:warning=Shell completions generated in: {}", completions_dir.display());
}
