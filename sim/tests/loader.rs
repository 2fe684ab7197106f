// Loading object files from disk

mod common;

use common::Asm;
use y86_pipe::isa::{reg_code::*, Stat};
use y86_pipe::{load, LoadError, PipeSim};

fn program() -> Asm {
    let mut asm = Asm::new();
    asm.irmovq(5, RAX).halt().pos(0x10).label("data").quad(0x1122334455667788);
    asm
}

#[test]
fn test_load_and_run() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("prog.yo");
    std::fs::write(&path, program().yo())?;

    let obj = load(&path)?;
    let mut pipe = PipeSim::new(obj.init_mem()?, false);
    assert_eq!(pipe.run(100), Stat::Hlt);
    assert_eq!(pipe.reg_file().read(RAX)?, 5);
    Ok(())
}

#[test]
fn test_round_trip() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("prog.yo");
    let text = program().yo();
    std::fs::write(&path, &text)?;

    let obj = load(&path)?;
    let mem = obj.init_mem()?;
    let snap = obj.snapshot(&mem)?;
    assert_eq!(snap, obj);
    assert_eq!(snap.to_string(), text);
    assert_eq!(mem.read_range(0x10, 8)?, 0x1122334455667788u64.to_le_bytes());
    Ok(())
}

#[test]
fn test_rejected_files() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;

    let path = dir.path().join("prog.txt");
    std::fs::write(&path, program().yo())?;
    assert!(matches!(load(&path), Err(LoadError::Extension(_))));

    let path = dir.path().join("absent.yo");
    assert!(matches!(load(&path), Err(LoadError::Io(..))));

    // the error names the offending line
    let path = dir.path().join("bad.yo");
    let mut text = program().yo();
    text.push_str("0x020: zz                   |\n");
    std::fs::write(&path, &text)?;
    match load(&path) {
        Err(LoadError::Malformed { line, .. }) => assert_eq!(line, text.lines().count()),
        r => anyhow::bail!("unexpected {r:?}"),
    }

    let path = dir.path().join("order.yo");
    let mut text = program().yo();
    text.push_str("0x008: 00                   |\n");
    std::fs::write(&path, &text)?;
    assert!(matches!(load(&path), Err(LoadError::AddressOrder { .. })));
    Ok(())
}
