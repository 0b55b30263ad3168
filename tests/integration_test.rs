// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut

mod common;

use common::fixtures::make_exe;
use oxidestation::core::bus::Bus;
use oxidestation::core::error::Result;
use oxidestation::core::loader::Executable;
use oxidestation::core::savestate::SaveState;

#[test]
fn test_basic_initialization() -> Result<()> {
    let bus = Bus::new();
    // PC starts at the BIOS entry point
    assert_eq!(bus.cpu().borrow().pc(), 0xBFC00000);
    Ok(())
}

#[test]
fn test_reset_restores_initial_state() {
    let mut bus = Bus::new();
    bus.execute(Bus::BATCH_CYCLES).unwrap();
    bus.reset();
    assert_eq!(bus.cpu().borrow().pc(), 0xBFC00000);
    assert_eq!(bus.cpu().borrow().cycles(), 0);
}

#[test]
fn test_exe_load_sets_entry_registers() -> Result<()> {
    let mut bus = Bus::new();

    let image = make_exe(0x8001_0000, &[0x0000_0000]);
    let exe = Executable::parse(&image)?;
    bus.load_executable(&exe)?;

    let cpu = bus.cpu();
    let cpu = cpu.borrow();
    assert_eq!(cpu.pc(), 0x8001_0000);
    assert_eq!(cpu.reg(28), 0x8002_0000); // GP
    assert_eq!(cpu.reg(29), 0x801F_FF00); // SP
    Ok(())
}

/// The end-to-end exception scenario: an executable whose text is one
/// SYSCALL instruction. After a single step the PC sits at the general
/// exception vector and the load-delay buffers survived untouched.
#[test]
fn test_syscall_exe_reaches_exception_vector() -> Result<()> {
    let mut bus = Bus::new();

    let image = make_exe(0x8001_0000, &[0x0000_000C]);
    let exe = Executable::parse(&image)?;
    bus.load_executable(&exe)?;

    let slots_before = bus.cpu().borrow().load_delay_slots();

    bus.execute(1)?;

    let cpu = bus.cpu();
    let cpu = cpu.borrow();
    assert_eq!(cpu.pc(), 0x8000_0080);
    assert_eq!(cpu.cop0().epc(), 0x8001_0000);
    assert_eq!(cpu.load_delay_slots(), slots_before);
    Ok(())
}

#[test]
fn test_exe_text_lands_in_ram() -> Result<()> {
    let mut bus = Bus::new();

    let words = [0x1234_5678, 0x9ABC_DEF0];
    let image = make_exe(0x8001_2000, &words);
    bus.load_executable(&Executable::parse(&image)?)?;

    assert_eq!(bus.read32(0x8001_2000)?, 0x1234_5678);
    assert_eq!(bus.read32(0x8001_2004)?, 0x9ABC_DEF0);
    Ok(())
}

#[test]
fn test_save_state_survives_a_file_round_trip() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("console.state");

    let mut bus = Bus::new();
    let image = make_exe(0x8001_0000, &[0x0000_0000, 0x0000_0000]);
    bus.load_executable(&Executable::parse(&image)?)?;
    bus.execute(Bus::BATCH_CYCLES)?;

    bus.save_state().save_to_file(&path)?;

    let mut restored = Bus::new();
    let mut stream = SaveState::load_from_file(&path)?;
    restored.load_state(&mut stream)?;

    assert_eq!(
        restored.cpu().borrow().pc(),
        bus.cpu().borrow().pc(),
    );
    assert_eq!(
        restored.save_state().payload(),
        bus.save_state().payload(),
    );
    Ok(())
}

#[test]
fn test_counting_program_runs_to_completion() -> Result<()> {
    // A small loop: count r2 up to 10, then spin on a branch to self
    //   addiu r1, r0, 10
    // loop:
    //   addiu r2, r2, 1
    //   bne   r2, r1, loop
    //   nop
    // done:
    //   beq   r0, r0, done
    //   nop
    let program = [
        0x2401_000A, // addiu r1, r0, 10
        0x2442_0001, // addiu r2, r2, 1
        0x1441_FFFE, // bne r2, r1, -2
        0x0000_0000, // nop
        0x1000_FFFF, // beq r0, r0, -1
        0x0000_0000, // nop
    ];

    let mut bus = Bus::new();
    let image = make_exe(0x8001_0000, &program);
    bus.load_executable(&Executable::parse(&image)?)?;

    bus.execute(100)?;
    assert_eq!(bus.cpu().borrow().reg(2), 10);
    Ok(())
}
