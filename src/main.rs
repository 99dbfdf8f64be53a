use clap::Parser;

use covpassdec::hcert;

/// Decode an EU Digital COVID Certificate from scanned QR code text.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Text content of the QR code, starting with the "HC1:" prefix.
    qr_text: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let pass = hcert::decode(&args.qr_text)?;
    println!(
        "{} {} ({} {}), born {}",
        pass.given_name,
        pass.family_name,
        pass.given_name_translit,
        pass.family_name_translit,
        pass.date_of_birth.format("%x"),
    );

    Ok(())
}
