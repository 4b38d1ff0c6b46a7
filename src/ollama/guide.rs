/// Print Ollama installation instructions for this OS
pub fn detect_and_guide() {
    println!("[WARNING] Ollama not found on your system\n");

    #[cfg(target_os = "macos")]
    {
        println!("docchat runs its chat and embedding models with Ollama:");
        println!("[INSTALL] macOS: brew install ollama");
        println!("   or");
        println!("[DOWNLOAD] Download: https://ollama.com/download/mac\n");
    }

    #[cfg(target_os = "linux")]
    {
        println!("docchat runs its chat and embedding models with Ollama:");
        println!("[INSTALL] Linux: curl -fsSL https://ollama.com/install.sh | sh");
        println!("   or");
        println!("[DOWNLOAD] Download: https://ollama.com/download/linux\n");
    }

    #[cfg(target_os = "windows")]
    {
        println!("docchat runs its chat and embedding models with Ollama:");
        println!("[DOWNLOAD] Windows: Download from https://ollama.com/download/windows\n");
    }

    println!("After installing Ollama:");
    println!("1. Start Ollama: ollama serve");
    println!("2. Start Qdrant: docker run -p 6333:6333 qdrant/qdrant");
    println!("3. Run docchat again!");
}

/// Print how to get Qdrant running
pub fn qdrant_guide(url: &str) {
    println!("[WARNING] Qdrant is not reachable at {}\n", url);
    println!("Start it in a container:");
    println!("   docker run -p 6333:6333 -v $(pwd)/qdrant_storage:/qdrant/storage qdrant/qdrant");
    println!("   or");
    println!("   podman run -p 6333:6333 qdrant/qdrant");
}
