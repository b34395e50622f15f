//! Example demonstrating the Ollama generator
//!
//! This example asks a local model for an operation plan over two layers.
//!
//! Note: This example requires Ollama to be running locally with a model installed.
//! To run: cargo run --example ollama_example

use geoproc_core::models::OperationType;
use geoproc_llm::{Generator, OllamaGenerator};

fn main() {
    println!("GeoProc LLM - Ollama Generator Example");
    println!("======================================\n");

    // Note: This assumes Ollama is running at localhost:11434
    // with the "llama3.1" model installed
    let generator = OllamaGenerator::localhost("llama3.1");
    println!("Model: {}\n", generator.model_name());

    let catalog = OperationType::catalog();
    let layers = [
        "layer_0: Point, 12 features, bbox [13.30, 52.45, 13.50, 52.56]",
        "layer_1: Polygon, 3 features, bbox [13.25, 52.40, 13.60, 52.60]",
    ];
    let prompt = format!(
        "Available operations:\n{}\n\nReturn a JSON object {{\"operations\": [{{\"operation\": ..., \"params\": {{...}}}}]}} \
         that answers: which points lie within 500 meters of the polygons?",
        catalog
    );

    println!("Attempting to generate a plan...");
    println!("(This will fail if Ollama is not running)\n");

    match generator.generate(&prompt, &layers) {
        Ok(plan) => println!("Plan:\n{}", plan),
        Err(e) => {
            println!("✗ Failed to generate a plan:");
            println!("  {}", e);
        }
    }
}
