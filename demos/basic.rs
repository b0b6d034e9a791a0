use indent_writer::PrefixWriter;
use std::io::Write;

fn main() -> std::io::Result<()> {
    let stdout = std::io::stdout();
    let mut handler = stdout.lock();
    let mut writer = PrefixWriter::new(&mut handler, "basic-example: ");

    writeln!(&mut writer, "I am prefixed")?;

    {
        let mut section = writer.nest("  ");
        writeln!(&mut section, "and so am I,")?;
        writeln!(&mut section.nest("- "), "nested twice")?;
        write!(&mut section, "while this line ")?;
    }

    writeln!(&mut writer, "ends on the outer writer")?;
    writeln!(&mut writer.unwrap(1), "and this one has no prefix at all")?;

    Ok(())
}
