/// Port discovery using midir
use anyhow::{anyhow, Context, Result};
use midir::{MidiInput, MidiInputPort, MidiOutput, MidiOutputPort};

/// Names of every input and output port the backend currently reports.
pub fn available_ports(client_name: &str) -> Result<(Vec<String>, Vec<String>)> {
    let midi_in = MidiInput::new(client_name).context("failed to create MIDI input")?;
    let midi_out = MidiOutput::new(client_name).context("failed to create MIDI output")?;

    let inputs = midi_in
        .ports()
        .iter()
        .filter_map(|p| midi_in.port_name(p).ok())
        .collect();
    let outputs = midi_out
        .ports()
        .iter()
        .filter_map(|p| midi_out.port_name(p).ok())
        .collect();
    Ok((inputs, outputs))
}

/// Index of the first name containing `needle`.
pub fn find_by_name<S: AsRef<str>>(names: &[S], needle: &str) -> Option<usize> {
    names.iter().position(|name| name.as_ref().contains(needle))
}

pub fn find_input_port(midi_in: &MidiInput, needle: &str) -> Result<(MidiInputPort, String)> {
    let ports = midi_in.ports();
    let names: Vec<String> = ports
        .iter()
        .map(|p| midi_in.port_name(p).unwrap_or_default())
        .collect();
    let index = find_by_name(&names, needle)
        .ok_or_else(|| anyhow!("no MIDI input port matching \"{}\"", needle))?;
    Ok((ports[index].clone(), names[index].clone()))
}

pub fn find_output_port(midi_out: &MidiOutput, needle: &str) -> Result<(MidiOutputPort, String)> {
    let ports = midi_out.ports();
    let names: Vec<String> = ports
        .iter()
        .map(|p| midi_out.port_name(p).unwrap_or_default())
        .collect();
    let index = find_by_name(&names, needle)
        .ok_or_else(|| anyhow!("no MIDI output port matching \"{}\"", needle))?;
    Ok((ports[index].clone(), names[index].clone()))
}
