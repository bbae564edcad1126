//! Parallel batch analysis of FIT files using rayon
//!
//! Every file is decoded and analyzed on its own; one failing file never
//! affects the others. Results come back in input order.

use crate::analysis::RideAnalyzer;
use crate::error::{RideLensError, Result};
use crate::import::{collect_decodable_files, DecodeConfig, FitDecoder};
use crate::models::ComprehensiveAnalysis;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Configuration for parallel analysis runs
#[derive(Debug, Clone)]
pub struct ParallelAnalysisConfig {
    /// Number of worker threads, rayon's default when unset
    pub num_threads: Option<usize>,
    /// Show progress bar while analyzing
    pub show_progress: bool,
}

impl Default for ParallelAnalysisConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            show_progress: true,
        }
    }
}

/// Outcome of analyzing a single file
#[derive(Debug, Clone)]
pub struct FileAnalysisResult {
    pub file_path: PathBuf,
    pub analysis: Option<ComprehensiveAnalysis>,
    pub error: Option<String>,
    /// Wall time spent on this file
    pub duration_ms: u128,
}

impl FileAnalysisResult {
    pub fn is_success(&self) -> bool {
        self.analysis.is_some()
    }
}

/// Summary of a parallel analysis run
#[derive(Debug, Clone, Default)]
pub struct ParallelAnalysisSummary {
    pub total_files: usize,
    pub successful_files: usize,
    pub failed_files: usize,
    /// Successful files that produced a heart rate analysis
    pub files_with_heart_rate: usize,
    pub total_duration_ms: u128,
    /// Per-file results in input order
    pub results: Vec<FileAnalysisResult>,
}

impl ParallelAnalysisSummary {
    fn from_results(results: Vec<FileAnalysisResult>, total_duration_ms: u128) -> Self {
        let successful_files = results.iter().filter(|r| r.is_success()).count();
        let files_with_heart_rate = results
            .iter()
            .filter_map(|r| r.analysis.as_ref())
            .filter(|a| a.heart_rate.is_some())
            .count();

        Self {
            total_files: results.len(),
            successful_files,
            failed_files: results.len() - successful_files,
            files_with_heart_rate,
            total_duration_ms,
            results,
        }
    }

    /// Files per second
    pub fn throughput_files_per_sec(&self) -> f64 {
        if self.total_duration_ms == 0 {
            return 0.0;
        }
        (self.successful_files as f64 / self.total_duration_ms as f64) * 1000.0
    }

    pub fn avg_time_per_file_ms(&self) -> f64 {
        if self.successful_files == 0 {
            return 0.0;
        }
        self.total_duration_ms as f64 / self.successful_files as f64
    }

    pub fn is_fully_successful(&self) -> bool {
        self.failed_files == 0
    }

    /// Paths and messages of the files that failed
    pub fn errors(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.results
            .iter()
            .filter_map(|r| r.error.as_deref().map(|e| (r.file_path.as_path(), e)))
    }

    /// Get human-readable summary
    pub fn to_string_pretty(&self) -> String {
        format!(
            "Batch Analysis Summary\n  \
             Total Files: {}\n  \
             Successful: {}\n  \
             Failed: {}\n  \
             With Heart Rate: {}\n  \
             Total Time: {:.2}s\n  \
             Throughput: {:.2} files/sec\n  \
             Avg Time/File: {:.2}ms",
            self.total_files,
            self.successful_files,
            self.failed_files,
            self.files_with_heart_rate,
            self.total_duration_ms as f64 / 1000.0,
            self.throughput_files_per_sec(),
            self.avg_time_per_file_ms()
        )
    }
}

/// Runs ride analysis over many files at once
#[derive(Debug, Clone, Default)]
pub struct ParallelAnalyzer {
    pub config: ParallelAnalysisConfig,
    analyzer: RideAnalyzer,
}

impl ParallelAnalyzer {
    pub fn new(decode: DecodeConfig) -> Self {
        Self::with_config(decode, ParallelAnalysisConfig::default())
    }

    pub fn with_config(decode: DecodeConfig, config: ParallelAnalysisConfig) -> Self {
        Self {
            config,
            analyzer: RideAnalyzer::new(decode),
        }
    }

    /// Analyze the given files in parallel
    pub fn analyze_files(&self, file_paths: &[PathBuf]) -> Result<ParallelAnalysisSummary> {
        let start_time = Instant::now();
        info!("Starting parallel analysis of {} files", file_paths.len());

        let progress = self.config.show_progress.then(|| {
            let pb = ProgressBar::new(file_paths.len() as u64);
            if let Ok(style) =
                ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({msg})")
            {
                pb.set_style(style.progress_chars("#>-"));
            }
            pb
        });

        let results = match self.config.num_threads {
            Some(num_threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(num_threads)
                    .build()
                    .map_err(|e| RideLensError::Internal(format!("Failed to create thread pool: {}", e)))?;
                pool.install(|| self.process_files(file_paths, progress.as_ref()))
            }
            None => self.process_files(file_paths, progress.as_ref()),
        };

        if let Some(pb) = progress {
            pb.finish_with_message("Complete");
        }

        let summary = ParallelAnalysisSummary::from_results(results, start_time.elapsed().as_millis());
        info!("{}", summary.to_string_pretty());
        Ok(summary)
    }

    /// Analyze every FIT file in a directory
    pub fn analyze_directory(&self, dir_path: &Path) -> Result<ParallelAnalysisSummary> {
        debug!("Scanning directory for FIT files: {:?}", dir_path);

        let files = collect_decodable_files(&FitDecoder::new(), dir_path)?;
        if files.is_empty() {
            warn!("No FIT files found in directory: {}", dir_path.display());
            return Ok(ParallelAnalysisSummary::default());
        }

        info!("Found {} FIT files in directory", files.len());
        self.analyze_files(&files)
    }

    fn process_files(&self, file_paths: &[PathBuf], progress: Option<&ProgressBar>) -> Vec<FileAnalysisResult> {
        file_paths
            .par_iter()
            .map(|file_path| {
                let file_start = Instant::now();
                let outcome = self.analyzer.analyze_file(file_path);
                let duration_ms = file_start.elapsed().as_millis();

                let result = match outcome {
                    Ok(analysis) => {
                        debug!(
                            "Analyzed {:?} ({} laps, {}ms)",
                            file_path,
                            analysis.laps.len(),
                            duration_ms
                        );
                        FileAnalysisResult {
                            file_path: file_path.clone(),
                            analysis: Some(analysis),
                            error: None,
                            duration_ms,
                        }
                    }
                    Err(e) => {
                        warn!("Failed to analyze {:?}: {} ({}ms)", file_path, e, duration_ms);
                        FileAnalysisResult {
                            file_path: file_path.clone(),
                            analysis: None,
                            error: Some(e.to_string()),
                            duration_ms,
                        }
                    }
                };

                if let Some(pb) = progress {
                    pb.inc(1);
                }
                result
            })
            .collect()
    }
}
